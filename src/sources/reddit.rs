use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use reqwest::{header, Client};
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::models::ContentItem;
use crate::sources::rate_limiter::RateLimiter;
use crate::sources::ContentSource;

const REDDIT_BASE_URL: &str = "https://www.reddit.com";
/// Reddit caps a single listing page at 100 children.
const MAX_PAGE_SIZE: u32 = 100;

pub struct RedditSource {
    client: Client,
    rate_limiter: RateLimiter,
    base_url: String,
    subreddits: Vec<String>,
    sort: String,
    limit: u32,
}

#[derive(Debug, Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Debug, Deserialize)]
struct ListingData {
    after: Option<String>,
    #[serde(default)]
    children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
struct Child {
    data: Post,
}

#[derive(Debug, Deserialize)]
struct Post {
    #[serde(default)]
    title: String,
    #[serde(default)]
    selftext: String,
    permalink: Option<String>,
    url: Option<String>,
    created_utc: Option<f64>,
    subreddit: Option<String>,
}

impl Post {
    fn into_item(self, base_url: &str) -> ContentItem {
        let url = match self.permalink {
            Some(permalink) => format!("{}{}", base_url, permalink),
            None => self.url.unwrap_or_default(),
        };
        let source = match self.subreddit {
            Some(sub) => format!("reddit/r/{}", sub),
            None => "reddit".to_string(),
        };
        let mut item = ContentItem::new(&source, &self.title, &self.selftext, &url);
        if let Some(created) = self.created_utc.and_then(timestamp_to_datetime) {
            item.created_at = created;
        }
        item
    }
}

fn timestamp_to_datetime(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    Utc.timestamp_opt(secs as i64, 0).single()
}

impl RedditSource {
    pub fn new(user_agent: &str, subreddits: Vec<String>, sort: &str, limit: u32) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(header::USER_AGENT, header::HeaderValue::from_str(user_agent)?);
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            rate_limiter: RateLimiter::default(),
            base_url: REDDIT_BASE_URL.to_string(),
            subreddits,
            sort: sort.to_string(),
            limit,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn listing_url(&self, subreddit: &str, page_size: u32, after: Option<&str>) -> String {
        let mut url = format!(
            "{}/r/{}/{}.json?limit={}&raw_json=1",
            self.base_url, subreddit, self.sort, page_size
        );
        if let Some(after) = after {
            url.push_str(&format!("&after={}", after));
        }
        url
    }

    /// Follows the listing `after` cursor until `limit` posts or the end.
    pub async fn fetch_subreddit(&self, subreddit: &str) -> Result<Vec<ContentItem>> {
        let mut items = Vec::new();
        let mut after: Option<String> = None;

        loop {
            let remaining = self.limit.saturating_sub(items.len() as u32);
            if remaining == 0 {
                break;
            }
            let page_size = remaining.min(MAX_PAGE_SIZE);
            let url = self.listing_url(subreddit, page_size, after.as_deref());

            self.rate_limiter.wait().await;
            tracing::debug!("Fetching: {}", url);
            let response = self.client.get(&url).send().await?;
            self.rate_limiter.update_from_response(&response).await;

            if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
                let retry_after = response
                    .headers()
                    .get("x-ratelimit-reset")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.trim().parse::<f64>().ok())
                    .map(|s| s.ceil() as u64)
                    .unwrap_or(60);
                return Err(Error::RateLimited(retry_after));
            }
            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::RedditApi(format!(
                    "Failed to fetch r/{}: {} - {}",
                    subreddit, status, body
                )));
            }

            let listing: Listing = response.json().await?;
            let page_count = listing.data.children.len();
            items.extend(
                listing
                    .data
                    .children
                    .into_iter()
                    .map(|child| child.data.into_item(&self.base_url)),
            );

            after = listing.data.after;
            if after.is_none() || page_count == 0 {
                break;
            }
        }

        items.truncate(self.limit as usize);
        Ok(items)
    }
}

#[async_trait]
impl ContentSource for RedditSource {
    async fn fetch(&self) -> Result<Vec<ContentItem>> {
        let mut items = Vec::new();
        for subreddit in &self.subreddits {
            match self.fetch_subreddit(subreddit).await {
                Ok(posts) => {
                    tracing::info!("Fetched {} posts from r/{}", posts.len(), subreddit);
                    items.extend(posts);
                }
                Err(e) => tracing::warn!("Skipping r/{}: {}", subreddit, e),
            }
        }
        Ok(items)
    }

    fn name(&self) -> &str {
        "reddit"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_parses_into_items() {
        let raw = r#"{
            "kind": "Listing",
            "data": {
                "after": "t3_abc",
                "children": [
                    {"kind": "t3", "data": {
                        "title": "VMware VCSP changes",
                        "selftext": "Partners are being cut",
                        "permalink": "/r/msp/comments/abc/vmware/",
                        "created_utc": 1700000000.0,
                        "subreddit": "msp"
                    }}
                ]
            }
        }"#;
        let listing: Listing = serde_json::from_str(raw).unwrap();
        assert_eq!(listing.data.after.as_deref(), Some("t3_abc"));

        let post = listing.data.children.into_iter().next().unwrap().data;
        let item = post.into_item(REDDIT_BASE_URL);
        assert_eq!(item.source, "reddit/r/msp");
        assert_eq!(item.url, "https://www.reddit.com/r/msp/comments/abc/vmware/");
        assert_eq!(item.created_at.timestamp(), 1_700_000_000);
        assert_eq!(item.scoring_text(), "VMware VCSP changes Partners are being cut");
    }

    #[test]
    fn test_listing_url_includes_cursor() {
        let source = RedditSource::new("test-agent", vec!["msp".into()], "new", 50).unwrap();
        assert_eq!(
            source.listing_url("msp", 50, Some("t3_x")),
            "https://www.reddit.com/r/msp/new.json?limit=50&raw_json=1&after=t3_x"
        );
    }
}
