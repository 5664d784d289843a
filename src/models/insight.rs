use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::content::Urgency;
use super::employee::Role;

/// A summarized, role-targeted piece of pricing intelligence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    pub title: String,
    pub url: String,
    pub source: String,
    pub vendor: Option<String>,
    pub urgency: Urgency,
    pub relevance_score: f64,
    pub summaries: BTreeMap<Role, String>,
    #[serde(default)]
    pub key_points: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Insight {
    /// Summary for a role, falling back to the executive summary and then any summary.
    pub fn summary_for(&self, role: Role) -> Option<&str> {
        self.summaries
            .get(&role)
            .or_else(|| self.summaries.get(&Role::Executive))
            .or_else(|| self.summaries.values().next())
            .map(|s| s.as_str())
    }
}

/// Insight shape the LLM is asked to return; joined back to items by index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMInsight {
    pub item_index: usize,
    #[serde(default)]
    pub vendor: Option<String>,
    #[serde(default)]
    pub urgency: Option<String>,
    #[serde(default)]
    pub summaries: BTreeMap<String, String>,
    #[serde(default)]
    pub key_points: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_for_falls_back_to_executive() {
        let mut summaries = BTreeMap::new();
        summaries.insert(Role::Executive, "exec view".to_string());
        let insight = Insight {
            title: "t".into(),
            url: "u".into(),
            source: "reddit".into(),
            vendor: None,
            urgency: Urgency::Low,
            relevance_score: 1.0,
            summaries,
            key_points: vec![],
            created_at: Utc::now(),
        };
        assert_eq!(insight.summary_for(Role::Sales), Some("exec view"));
    }
}
