use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContentItem {
    pub source: String,
    pub title: String,
    #[serde(default)]
    pub content: String,
    /// Alternate body field some sources populate instead of `content`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    pub url: String,
    pub created_at: DateTime<Utc>,
}

impl ContentItem {
    pub fn new(source: &str, title: &str, content: &str, url: &str) -> Self {
        Self {
            source: source.to_string(),
            title: title.to_string(),
            content: content.to_string(),
            text: None,
            url: url.to_string(),
            created_at: Utc::now(),
        }
    }

    pub fn body(&self) -> &str {
        if self.content.trim().is_empty() {
            self.text.as_deref().unwrap_or("")
        } else {
            &self.content
        }
    }

    /// Title and body joined with a single space, as fed to the scorer.
    pub fn scoring_text(&self) -> String {
        let body = self.body();
        match (self.title.trim().is_empty(), body.trim().is_empty()) {
            (true, true) => String::new(),
            (false, true) => self.title.clone(),
            (true, false) => body.to_string(),
            (false, false) => format!("{} {}", self.title, body),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

impl std::fmt::Display for Urgency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Urgency::High => write!(f, "high"),
            Urgency::Medium => write!(f, "medium"),
            Urgency::Low => write!(f, "low"),
        }
    }
}

impl From<&str> for Urgency {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "high" | "critical" | "urgent" => Urgency::High,
            "medium" | "moderate" => Urgency::Medium,
            _ => Urgency::Low,
        }
    }
}

/// Scoring output for a single piece of text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentScore {
    pub relevance_score: f64,
    pub urgency: Urgency,
    pub matched_companies: BTreeSet<String>,
    pub confidence: f64,
}

impl ContentScore {
    pub fn empty() -> Self {
        Self {
            relevance_score: 0.0,
            urgency: Urgency::Low,
            matched_companies: BTreeSet::new(),
            confidence: 0.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredItem {
    pub item: ContentItem,
    pub relevance_score: f64,
    pub urgency: Urgency,
    pub matched_companies: BTreeSet<String>,
    pub confidence: f64,
    pub fingerprint: String,
}

impl ScoredItem {
    pub fn new(item: ContentItem, score: ContentScore, fingerprint: String) -> Self {
        Self {
            item,
            relevance_score: score.relevance_score,
            urgency: score.urgency,
            matched_companies: score.matched_companies,
            confidence: score.confidence,
            fingerprint,
        }
    }

    pub fn primary_vendor(&self) -> Option<&str> {
        self.matched_companies.iter().next().map(|s| s.as_str())
    }
}
