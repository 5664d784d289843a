use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::llm::parser::parse_llm_response;
use crate::llm::prompts::{SummaryRequest, SYSTEM_PROMPT};
use crate::llm::provider::LLMProvider;
use crate::models::LLMInsight;

const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

pub struct ClaudeProvider {
    client: Client,
    api_key: String,
    model: String,
}

#[derive(Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    messages: Vec<ClaudeMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
}

#[derive(Serialize, Deserialize)]
struct ClaudeMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    error: Option<ClaudeError>,
}

#[derive(Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Deserialize)]
struct ClaudeError {
    message: String,
}

impl ClaudeProvider {
    pub fn new(api_key: String, model: Option<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(120))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model: model.unwrap_or_else(|| DEFAULT_MODEL.to_string()),
        })
    }

    async fn complete(&self, prompt: String) -> Result<String> {
        let request_body = ClaudeRequest {
            model: self.model.clone(),
            max_tokens: 4096,
            system: Some(SYSTEM_PROMPT.to_string()),
            messages: vec![ClaudeMessage {
                role: "user".to_string(),
                content: prompt,
            }],
        };

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&request_body)
            .send()
            .await
            .map_err(|e| Error::LLMApi(format!("Failed to send request: {}", e)))?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok())
                .unwrap_or(30);
            return Err(Error::RateLimited(retry_after));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::LLMApi(format!(
                "Claude API error ({}): {}",
                status, body
            )));
        }

        let result: ClaudeResponse = response
            .json()
            .await
            .map_err(|e| Error::LLMApi(format!("Failed to parse Claude response: {}", e)))?;

        if let Some(error) = result.error {
            return Err(Error::LLMApi(error.message));
        }

        let text = result
            .content
            .into_iter()
            .filter(|c| c.content_type == "text")
            .filter_map(|c| c.text)
            .collect::<Vec<_>>()
            .join("");

        if text.is_empty() {
            return Err(Error::LLMApi("Empty response from Claude".to_string()));
        }

        Ok(text)
    }
}

#[async_trait]
impl LLMProvider for ClaudeProvider {
    async fn summarize(&self, request: SummaryRequest) -> Result<Vec<LLMInsight>> {
        let prompt = request.to_prompt();
        tracing::debug!(
            "Sending {} items (~{} tokens) to Claude",
            request.items.len(),
            request.estimate_tokens()
        );

        let text = self.complete(prompt.clone()).await?;
        match parse_llm_response(&text) {
            Ok(insights) => Ok(insights),
            Err(e) => {
                tracing::warn!("Unparsable Claude response, retrying once: {}", e);
                let retry_prompt = format!(
                    "{}\nYour previous reply was not valid JSON. Reply with the JSON array only.",
                    prompt
                );
                let text = self.complete(retry_prompt).await?;
                parse_llm_response(&text)
            }
        }
    }

    fn max_context_tokens(&self) -> usize {
        200_000
    }

    fn name(&self) -> &str {
        "Claude"
    }
}
