pub mod content;
pub mod company;
pub mod insight;
pub mod employee;

pub use content::*;
pub use company::*;
pub use insight::*;
pub use employee::*;
