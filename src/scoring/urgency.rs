//! Ordered urgency rules.
//!
//! Rules are evaluated top to bottom and the first match wins; the score
//! thresholds only apply when no rule fires. Reordering the list changes
//! classification results.

use crate::config::{IntelConfig, ScoringSettings};
use crate::error::Result;
use crate::models::Urgency;
use crate::scoring::patterns::{
    KeywordMatcher, PhraseFamily, DEADLINE, URGENCY_HIGH, URGENCY_MEDIUM,
};
use crate::text::normalize_phrase;

pub const RULE_ECOSYSTEM_SHUTDOWN: &str = "ecosystem_shutdown";
pub const RULE_BUSINESS_IMPACT: &str = "business_impact";
pub const RULE_DEADLINE: &str = "deadline";
pub const RULE_SCALE_HIGH: &str = "scale_high";
pub const RULE_URGENCY_HIGH: &str = "urgency_high_keywords";
pub const RULE_SCALE_MEDIUM: &str = "scale_medium";
pub const RULE_URGENCY_MEDIUM: &str = "urgency_medium_keywords";
pub const RULE_SCORE_THRESHOLD: &str = "score_threshold";

#[derive(Debug, Clone)]
pub enum UrgencyPredicate {
    Phrases(KeywordMatcher),
    Patterns(PhraseFamily),
    /// Plain substring search over normalized text; used when regex
    /// compilation is unavailable.
    Substrings(Vec<String>),
}

impl UrgencyPredicate {
    fn matches(&self, text: &str, normalized: &str) -> bool {
        match self {
            UrgencyPredicate::Phrases(matcher) => matcher.is_match(text),
            UrgencyPredicate::Patterns(family) => family.is_match(text),
            UrgencyPredicate::Substrings(phrases) => {
                phrases.iter().any(|p| normalized.contains(p.as_str()))
            }
        }
    }

    fn substrings(phrases: &[String]) -> Self {
        UrgencyPredicate::Substrings(
            phrases
                .iter()
                .map(|p| normalize_phrase(p))
                .filter(|p| !p.is_empty())
                .collect(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct UrgencyRule {
    pub name: &'static str,
    pub predicate: UrgencyPredicate,
    pub urgency: Urgency,
}

#[derive(Debug, Clone)]
pub struct UrgencyClassifier {
    rules: Vec<UrgencyRule>,
    high_threshold: f64,
    medium_threshold: f64,
}

impl UrgencyClassifier {
    pub fn compile(config: &IntelConfig) -> Result<Self> {
        let phrases = |list: &[String]| -> Result<UrgencyPredicate> {
            Ok(UrgencyPredicate::Phrases(KeywordMatcher::compile(list)?))
        };
        let u = &config.urgency;

        let rules = vec![
            rule(RULE_ECOSYSTEM_SHUTDOWN, phrases(&u.ecosystem_shutdown)?, Urgency::High),
            rule(RULE_BUSINESS_IMPACT, phrases(&u.business_impact)?, Urgency::High),
            rule(
                RULE_DEADLINE,
                UrgencyPredicate::Patterns(PhraseFamily::compile(config.pattern_list(DEADLINE))?),
                Urgency::High,
            ),
            rule(RULE_SCALE_HIGH, phrases(&u.scale_high)?, Urgency::High),
            rule(RULE_URGENCY_HIGH, phrases(config.keyword_list(URGENCY_HIGH))?, Urgency::High),
            rule(RULE_SCALE_MEDIUM, phrases(&u.scale_medium)?, Urgency::Medium),
            rule(
                RULE_URGENCY_MEDIUM,
                phrases(config.keyword_list(URGENCY_MEDIUM))?,
                Urgency::Medium,
            ),
        ];

        Ok(Self::with_rules(rules, &config.scoring))
    }

    /// Substring-only rules. Deadline detection needs regexes and is skipped.
    pub fn substring(config: &IntelConfig) -> Self {
        let u = &config.urgency;
        let rules = vec![
            rule(
                RULE_ECOSYSTEM_SHUTDOWN,
                UrgencyPredicate::substrings(&u.ecosystem_shutdown),
                Urgency::High,
            ),
            rule(
                RULE_BUSINESS_IMPACT,
                UrgencyPredicate::substrings(&u.business_impact),
                Urgency::High,
            ),
            rule(RULE_SCALE_HIGH, UrgencyPredicate::substrings(&u.scale_high), Urgency::High),
            rule(
                RULE_URGENCY_HIGH,
                UrgencyPredicate::substrings(config.keyword_list(URGENCY_HIGH)),
                Urgency::High,
            ),
            rule(RULE_SCALE_MEDIUM, UrgencyPredicate::substrings(&u.scale_medium), Urgency::Medium),
            rule(
                RULE_URGENCY_MEDIUM,
                UrgencyPredicate::substrings(config.keyword_list(URGENCY_MEDIUM)),
                Urgency::Medium,
            ),
        ];

        Self::with_rules(rules, &config.scoring)
    }

    pub fn with_rules(rules: Vec<UrgencyRule>, settings: &ScoringSettings) -> Self {
        Self {
            rules,
            high_threshold: settings.high_score_threshold,
            medium_threshold: settings.medium_score_threshold,
        }
    }

    pub fn rule_names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name).collect()
    }

    pub fn classify(&self, text: &str, score: f64) -> Urgency {
        self.classify_with_rule(text, score).0
    }

    /// Urgency plus the name of the rule that decided it.
    pub fn classify_with_rule(&self, text: &str, score: f64) -> (Urgency, &'static str) {
        if !text.trim().is_empty() {
            let normalized = normalize_phrase(text);
            for rule in &self.rules {
                if rule.predicate.matches(text, &normalized) {
                    return (rule.urgency, rule.name);
                }
            }
        }

        let urgency = if score >= self.high_threshold {
            Urgency::High
        } else if score >= self.medium_threshold {
            Urgency::Medium
        } else {
            Urgency::Low
        };
        (urgency, RULE_SCORE_THRESHOLD)
    }
}

fn rule(name: &'static str, predicate: UrgencyPredicate, urgency: Urgency) -> UrgencyRule {
    UrgencyRule { name, predicate, urgency }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classifier() -> UrgencyClassifier {
        UrgencyClassifier::compile(&IntelConfig::builtin().unwrap()).unwrap()
    }

    #[test]
    fn test_rule_order_is_fixed() {
        assert_eq!(
            classifier().rule_names(),
            vec![
                RULE_ECOSYSTEM_SHUTDOWN,
                RULE_BUSINESS_IMPACT,
                RULE_DEADLINE,
                RULE_SCALE_HIGH,
                RULE_URGENCY_HIGH,
                RULE_SCALE_MEDIUM,
                RULE_URGENCY_MEDIUM,
            ]
        );
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let text = "Vendor announces program shutdown affecting thousands of partners";
        let (urgency, rule) = classifier().classify_with_rule(text, 0.0);
        assert_eq!(urgency, Urgency::High);
        assert_eq!(rule, RULE_ECOSYSTEM_SHUTDOWN);
    }

    #[test]
    fn test_deadline_rule() {
        let (urgency, rule) =
            classifier().classify_with_rule("Renew before March 2026 or lose tiers", 0.0);
        assert_eq!(urgency, Urgency::High);
        assert_eq!(rule, RULE_DEADLINE);
    }

    #[test]
    fn test_each_rule_reports_its_name() {
        let c = classifier();
        let cases = [
            ("Partner program termination announced", Urgency::High, RULE_ECOSYSTEM_SHUTDOWN),
            ("Price hike for all customers", Urgency::High, RULE_BUSINESS_IMPACT),
            ("Renew before March 2026 or lose tiers", Urgency::High, RULE_DEADLINE),
            ("Thousands of MSPs are affected", Urgency::High, RULE_SCALE_HIGH),
            ("Urgent: backup licensing changes", Urgency::High, RULE_URGENCY_HIGH),
            ("Dozens of partners noticed", Urgency::Medium, RULE_SCALE_MEDIUM),
            ("Roadmap preview for the new tiers", Urgency::Medium, RULE_URGENCY_MEDIUM),
        ];
        for (text, urgency, name) in cases {
            assert_eq!(c.classify_with_rule(text, 0.0), (urgency, name), "{}", text);
        }
    }

    #[test]
    fn test_medium_keyword_ignores_high_score() {
        let (urgency, rule) =
            classifier().classify_with_rule("Roadmap preview for the new tiers", 9.0);
        assert_eq!(urgency, Urgency::Medium);
        assert_eq!(rule, RULE_URGENCY_MEDIUM);
    }

    #[test]
    fn test_business_impact_outranks_deadline() {
        let text = "Price change for all customers effective March 1, 2026";
        let (urgency, rule) = classifier().classify_with_rule(text, 0.0);
        assert_eq!(urgency, Urgency::High);
        assert_eq!(rule, RULE_BUSINESS_IMPACT);
    }

    #[test]
    fn test_medium_scale_beats_threshold() {
        let (urgency, rule) = classifier().classify_with_rule("dozens of partners noticed", 9.0);
        assert_eq!(urgency, Urgency::Medium);
        assert_eq!(rule, RULE_SCALE_MEDIUM);
    }

    #[test]
    fn test_threshold_fallback() {
        let c = classifier();
        assert_eq!(c.classify("nothing notable here", 0.0), Urgency::Low);
        assert_eq!(c.classify("nothing notable here", 3.5), Urgency::Medium);
        assert_eq!(c.classify("nothing notable here", 7.0), Urgency::High);
        assert_eq!(c.classify("", 0.0), Urgency::Low);
    }

    #[test]
    fn test_substring_classifier_still_forces_shutdown_high() {
        let c = UrgencyClassifier::substring(&IntelConfig::builtin().unwrap());
        assert!(!c.rule_names().contains(&RULE_DEADLINE));
        assert_eq!(c.classify("The VCSP   Program is changing", 0.0), Urgency::High);
    }
}
