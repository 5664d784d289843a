pub mod html;
pub mod roster;

pub use html::{digest_file_name, render_digest};
pub use roster::{load_employees, parse_employees, recipients_by_role};
