use async_trait::async_trait;
use crate::error::Result;
use crate::llm::prompts::SummaryRequest;
use crate::models::LLMInsight;

#[async_trait]
pub trait LLMProvider: Send + Sync {
    async fn summarize(&self, request: SummaryRequest) -> Result<Vec<LLMInsight>>;
    fn max_context_tokens(&self) -> usize;
    fn name(&self) -> &str;
}
