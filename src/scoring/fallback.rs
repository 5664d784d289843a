use crate::config::{IntelConfig, ScoringSettings};
use crate::scoring::patterns::{PRICE_POINTS, PRICING_KEYWORDS, URGENCY_HIGH, URGENCY_MEDIUM};
use crate::text::normalize_phrase;

/// Substring scorer used when the pattern tables fail to compile.
///
/// Counts distinct phrases present per category and applies the configured
/// flat weights; no contextual multipliers or boosts.
#[derive(Debug, Clone)]
pub struct FallbackScorer {
    keywords: Vec<String>,
    urgency: Vec<String>,
    vendors: Vec<String>,
    keyword_weight: f64,
    urgency_weight: f64,
    vendor_weight: f64,
}

impl FallbackScorer {
    pub fn new(config: &IntelConfig, vendors: &[String]) -> Self {
        let collect = |lists: &[&[String]]| -> Vec<String> {
            let mut out: Vec<String> = lists
                .iter()
                .flat_map(|l| l.iter())
                .map(|p| normalize_phrase(p))
                .filter(|p| !p.is_empty())
                .collect();
            out.sort();
            out.dedup();
            out
        };

        let ScoringSettings {
            keyword_weight,
            urgency_weight,
            vendor_weight,
            ..
        } = config.scoring;

        Self {
            keywords: collect(&[
                config.keyword_list(PRICING_KEYWORDS),
                config.keyword_list(PRICE_POINTS),
            ]),
            urgency: collect(&[
                config.keyword_list(URGENCY_HIGH),
                config.keyword_list(URGENCY_MEDIUM),
            ]),
            vendors: collect(&[vendors]),
            keyword_weight,
            urgency_weight,
            vendor_weight,
        }
    }

    pub fn score(&self, text: &str) -> f64 {
        let normalized = normalize_phrase(text);
        if normalized.is_empty() {
            return 0.0;
        }

        let hits = |phrases: &[String]| {
            phrases
                .iter()
                .filter(|p| normalized.contains(p.as_str()))
                .count() as f64
        };

        hits(&self.keywords) * self.keyword_weight
            + hits(&self.urgency) * self.urgency_weight
            + hits(&self.vendors) * self.vendor_weight
    }
}
