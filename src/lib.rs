pub mod config;
pub mod error;
pub mod text;
pub mod models;
pub mod companies;
pub mod scoring;
pub mod sources;
pub mod llm;
pub mod digest;
pub mod storage;
pub mod pipeline;

pub use companies::{AliasMatcher, CompanyTable};
pub use config::{Config, IntelConfig, PipelineConfig};
pub use error::{Error, Result};
pub use llm::{ClaudeProvider, LLMProvider};
pub use pipeline::ContentPipeline;
pub use scoring::{RelevanceScorer, ScoreBreakdown, UrgencyClassifier};
pub use sources::{ContentSource, GoogleSource, RedditSource};
pub use storage::Storage;
