pub mod provider;
pub mod claude;
pub mod prompts;
pub mod parser;
pub mod batcher;
pub mod summary;

pub use provider::LLMProvider;
pub use claude::ClaudeProvider;
pub use prompts::SummaryRequest;
pub use batcher::ItemBatcher;
pub use summary::{extractive_insight, merge_insights};
