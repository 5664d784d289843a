use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::ContentItem;
use crate::sources::rate_limiter::RateLimiter;
use crate::sources::ContentSource;

const GOOGLE_SEARCH_URL: &str = "https://www.googleapis.com/customsearch/v1";
/// The Custom Search API returns at most 10 results per request.
const MAX_RESULTS: u32 = 10;

pub struct GoogleSource {
    client: Client,
    rate_limiter: RateLimiter,
    api_key: String,
    cse_id: String,
    queries: Vec<String>,
    results_per_query: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    snippet: String,
    link: String,
}

impl From<SearchResult> for ContentItem {
    fn from(result: SearchResult) -> Self {
        let mut item = ContentItem::new("google", &result.title, "", &result.link);
        item.text = Some(result.snippet);
        item
    }
}

impl GoogleSource {
    pub fn new(
        api_key: String,
        cse_id: String,
        queries: Vec<String>,
        results_per_query: u32,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::default(),
            api_key,
            cse_id,
            queries,
            results_per_query: results_per_query.clamp(1, MAX_RESULTS),
        })
    }

    pub async fn search(&self, query: &str) -> Result<Vec<ContentItem>> {
        self.rate_limiter.wait().await;
        tracing::debug!("Searching Google for: {}", query);

        let num = self.results_per_query.to_string();
        let response = self
            .client
            .get(GOOGLE_SEARCH_URL)
            .query(&[
                ("key", self.api_key.as_str()),
                ("cx", self.cse_id.as_str()),
                ("q", query),
                ("num", num.as_str()),
                ("dateRestrict", "d1"),
            ])
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(Error::RateLimited(60));
        }
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::GoogleApi(format!(
                "Search for '{}' failed: {} - {}",
                query, status, body
            )));
        }

        let results: SearchResponse = response.json().await?;
        Ok(results.items.into_iter().map(ContentItem::from).collect())
    }
}

#[async_trait]
impl ContentSource for GoogleSource {
    async fn fetch(&self) -> Result<Vec<ContentItem>> {
        let mut items = Vec::new();
        for query in &self.queries {
            match self.search(query).await {
                Ok(results) => items.extend(results),
                Err(e) => tracing::warn!("Skipping Google query '{}': {}", query, e),
            }
        }
        Ok(items)
    }

    fn name(&self) -> &str {
        "google"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_search_results_use_snippet_as_text() {
        let raw = r#"{"items": [{
            "title": "Veeam raises prices",
            "snippet": "New per-socket pricing",
            "link": "https://news/1"
        }]}"#;
        let response: SearchResponse = serde_json::from_str(raw).unwrap();
        let item: ContentItem = response.items.into_iter().next().unwrap().into();
        assert_eq!(item.source, "google");
        assert_eq!(item.scoring_text(), "Veeam raises prices New per-socket pricing");
    }

    #[test]
    fn test_empty_response_has_no_items() {
        let response: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(response.items.is_empty());
    }
}
