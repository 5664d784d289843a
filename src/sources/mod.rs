pub mod rate_limiter;
pub mod reddit;
pub mod google;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::ContentItem;

pub use google::GoogleSource;
pub use rate_limiter::RateLimiter;
pub use reddit::RedditSource;

/// A feed of raw content items. A failing source is skipped by the pipeline.
#[async_trait]
pub trait ContentSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<ContentItem>>;

    fn name(&self) -> &str;
}
