use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::env;
use std::path::{Path, PathBuf};

const BUILTIN_INTEL_CONFIG: &str = include_str!("../data/intel.yaml");

#[derive(Debug, Clone)]
pub struct Config {
    pub anthropic_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub google_cse_id: Option<String>,
    pub reddit_user_agent: String,
    pub database_path: String,
    pub intel_config_path: Option<PathBuf>,
    pub companies_path: Option<PathBuf>,
    pub employees_path: PathBuf,
    pub output_dir: PathBuf,
    pub concurrency_limit: usize,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let anthropic_api_key = non_empty_var("ANTHROPIC_API_KEY");
        let google_api_key = non_empty_var("GOOGLE_API_KEY");
        let google_cse_id = non_empty_var("GOOGLE_CSE_ID");

        let reddit_user_agent = non_empty_var("REDDIT_USER_AGENT")
            .unwrap_or_else(|| "pricing-intel/0.1 (vendor pricing digest)".to_string());

        let database_path = env::var("DATABASE_PATH")
            .unwrap_or_else(|_| "pricing_intel.db".to_string());

        let intel_config_path = non_empty_var("INTEL_CONFIG_PATH").map(PathBuf::from);
        let companies_path = non_empty_var("COMPANIES_PATH").map(PathBuf::from);

        let employees_path = env::var("EMPLOYEES_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("employees.csv"));

        let output_dir = env::var("OUTPUT_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("digests"));

        let concurrency_limit = env::var("CONCURRENCY_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(4);

        if concurrency_limit == 0 {
            return Err(Error::Config("CONCURRENCY_LIMIT must be at least 1".to_string()));
        }

        Ok(Self {
            anthropic_api_key,
            google_api_key,
            google_cse_id,
            reddit_user_agent,
            database_path,
            intel_config_path,
            companies_path,
            employees_path,
            output_dir,
            concurrency_limit,
        })
    }
}

fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    pub concurrency_limit: usize,
    pub max_items: usize,
    pub output_dir: PathBuf,
    pub dry_run: bool,
}

impl PipelineConfig {
    pub fn new(config: &Config, intel: &IntelConfig) -> Self {
        Self {
            concurrency_limit: config.concurrency_limit,
            max_items: intel.scoring.max_items,
            output_dir: config.output_dir.clone(),
            dry_run: config.anthropic_api_key.is_none(),
        }
    }
}

/// Keyword, pattern and threshold tables that drive relevance scoring.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IntelConfig {
    #[serde(default)]
    pub keywords: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub vendors: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub patterns: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    pub urgency: UrgencyPhrases,
    #[serde(default)]
    pub scoring: ScoringSettings,
    #[serde(default)]
    pub sources: SourceSettings,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UrgencyPhrases {
    #[serde(default)]
    pub ecosystem_shutdown: Vec<String>,
    #[serde(default)]
    pub business_impact: Vec<String>,
    #[serde(default)]
    pub scale_high: Vec<String>,
    #[serde(default)]
    pub scale_medium: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringSettings {
    pub keyword_weight: f64,
    pub urgency_weight: f64,
    pub vendor_weight: f64,
    pub high_score_threshold: f64,
    pub medium_score_threshold: f64,
    pub max_items: usize,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            keyword_weight: 2.0,
            urgency_weight: 1.5,
            vendor_weight: 1.0,
            high_score_threshold: 7.0,
            medium_score_threshold: 3.5,
            max_items: 25,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceSettings {
    pub subreddits: Vec<String>,
    pub reddit_sort: String,
    pub reddit_limit: u32,
    pub google_queries: Vec<String>,
    pub google_results: u32,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            subreddits: Vec::new(),
            reddit_sort: "new".to_string(),
            reddit_limit: 50,
            google_queries: Vec::new(),
            google_results: 10,
        }
    }
}

impl IntelConfig {
    pub fn builtin() -> Result<Self> {
        Self::from_yaml_str(BUILTIN_INTEL_CONFIG)
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        tracing::debug!("Loaded intel config from {}", path.as_ref().display());
        Self::from_yaml_str(&raw)
    }

    /// Parses and validates a YAML (or JSON) document.
    pub fn from_yaml_str(raw: &str) -> Result<Self> {
        let config: IntelConfig = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let s = &self.scoring;
        if !(s.medium_score_threshold > 0.0) {
            return Err(Error::Config(
                "scoring.medium_score_threshold must be greater than 0".to_string(),
            ));
        }
        if s.medium_score_threshold > s.high_score_threshold {
            return Err(Error::Config(format!(
                "scoring.medium_score_threshold ({}) exceeds high_score_threshold ({})",
                s.medium_score_threshold, s.high_score_threshold
            )));
        }
        for (name, weight) in [
            ("keyword_weight", s.keyword_weight),
            ("urgency_weight", s.urgency_weight),
            ("vendor_weight", s.vendor_weight),
        ] {
            if !weight.is_finite() || weight < 0.0 {
                return Err(Error::Config(format!("scoring.{} must be non-negative", name)));
            }
        }
        if s.max_items == 0 {
            return Err(Error::Config("scoring.max_items must be at least 1".to_string()));
        }
        Ok(())
    }

    pub fn keyword_list(&self, category: &str) -> &[String] {
        self.keywords.get(category).map(|v| v.as_slice()).unwrap_or(&[])
    }

    pub fn pattern_list(&self, family: &str) -> &[String] {
        self.patterns.get(family).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Every vendor across categories, lowercased and deduplicated.
    pub fn vendor_list(&self) -> Vec<String> {
        self.vendors
            .values()
            .flatten()
            .map(|v| v.trim().to_lowercase())
            .filter(|v| !v.is_empty())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_config_loads() {
        let config = IntelConfig::builtin().unwrap();
        assert!(!config.keyword_list("pricing_keywords").is_empty());
        assert!(config.keyword_list("msp_context").len() >= 25);
        assert!(config.vendor_list().contains(&"vmware".to_string()));
        assert!(config.scoring.medium_score_threshold < config.scoring.high_score_threshold);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config =
            IntelConfig::from_yaml_str("keywords:\n  pricing_keywords: [price]\n").unwrap();
        assert_eq!(config.scoring.max_items, 25);
        assert!(config.keyword_list("urgency_high").is_empty());
        assert!(config.urgency.ecosystem_shutdown.is_empty());
    }

    #[test]
    fn test_rejects_inverted_thresholds() {
        let raw = "scoring:\n  high_score_threshold: 2.0\n  medium_score_threshold: 5.0\n";
        assert!(matches!(IntelConfig::from_yaml_str(raw), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_zero_medium_threshold() {
        let raw = "scoring:\n  medium_score_threshold: 0.0\n";
        assert!(IntelConfig::from_yaml_str(raw).is_err());
    }

    #[test]
    fn test_accepts_json() {
        let raw = r#"{"vendors": {"backup": ["Veeam", "veeam", "Acronis"]}}"#;
        let config = IntelConfig::from_yaml_str(raw).unwrap();
        assert_eq!(config.vendor_list(), vec!["acronis".to_string(), "veeam".to_string()]);
    }
}
