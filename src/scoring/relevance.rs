use serde::Serialize;
use std::sync::Arc;

use crate::companies::AliasMatcher;
use crate::config::{IntelConfig, ScoringSettings};
use crate::error::Result;
use crate::models::{ContentScore, MatchResult, Urgency};
use crate::scoring::fallback::FallbackScorer;
use crate::scoring::patterns::PatternTables;
use crate::scoring::urgency::UrgencyClassifier;

const SUB_SCORE_CAP: f64 = 10.0;
const MSP_CONTEXT_MULTIPLIER: f64 = 1.5;

const PRICING_KEYWORD: f64 = 1.5;
const PRICE_POINT: f64 = 3.0;
const PRICE_SHOCK_BONUS: f64 = 4.0;
const LICENSE_ENFORCEMENT_BONUS: f64 = 3.0;

const MARGIN_KEYWORD: f64 = 2.0;
const CHANNEL_KEYWORD: f64 = 1.0;
const PARTNER_PROGRAM_BONUS: f64 = 4.0;

const VENDOR_MENTION: f64 = 1.0;
const COMPETITIVE_KEYWORD: f64 = 1.5;
const MIGRATION_BONUS: f64 = 3.0;

const MA_KEYWORD: f64 = 2.5;
const CNAPP_KEYWORD: f64 = 2.0;
const ACQUISITION_BONUS: f64 = 3.0;

const URGENCY_HIGH_KEYWORD: f64 = 3.0;
const URGENCY_MEDIUM_KEYWORD: f64 = 1.5;
const DEADLINE_BONUS: f64 = 3.0;

const MA_BOOST_CAP: f64 = 6.5;
const CLOUD_SECURITY_BOOST_CAP: f64 = 4.0;
const BUSINESS_CONTEXT_BOOST_CAP: f64 = 10.0;

#[derive(Debug, Clone)]
pub struct RelevanceWeights {
    pub immediate_revenue_impact: f64,
    pub margin_opportunity: f64,
    pub competitive_advantage: f64,
    pub strategic_value: f64,
    pub urgency_factor: f64,
}

impl Default for RelevanceWeights {
    fn default() -> Self {
        Self {
            immediate_revenue_impact: 0.30,
            margin_opportunity: 0.25,
            competitive_advantage: 0.20,
            strategic_value: 0.15,
            urgency_factor: 0.10,
        }
    }
}

/// Every intermediate value behind a relevance score.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub immediate_revenue_impact: f64,
    pub margin_opportunity: f64,
    pub competitive_advantage: f64,
    pub strategic_value: f64,
    pub urgency_factor: f64,
    pub base_score: f64,
    pub context_multiplier: f64,
    pub ma_boost: f64,
    pub cloud_security_boost: f64,
    pub business_context_boost: f64,
    pub total: f64,
    pub fallback: bool,
}

enum Engine {
    Patterns(Box<PatternTables>),
    Fallback(FallbackScorer),
}

/// Scores text for vendor-pricing relevance and classifies its urgency.
///
/// Construction compiles every table once. If any pattern fails to compile the
/// scorer degrades to substring matching instead of failing. The total is a
/// sum of individually capped terms and has no overall upper bound.
pub struct RelevanceScorer {
    engine: Engine,
    urgency: UrgencyClassifier,
    matcher: Option<Arc<AliasMatcher>>,
    weights: RelevanceWeights,
    settings: ScoringSettings,
}

impl RelevanceScorer {
    pub fn new(config: &IntelConfig, matcher: Option<Arc<AliasMatcher>>) -> Self {
        let vendors = match &matcher {
            Some(m) => m.expand_keyword_list(&config.vendor_list()),
            None => config.vendor_list(),
        };

        let (engine, urgency) = match Self::compile(config, &vendors) {
            Ok((tables, urgency)) => (Engine::Patterns(Box::new(tables)), urgency),
            Err(e) => {
                tracing::warn!("Pattern compilation failed, using substring scoring: {}", e);
                (
                    Engine::Fallback(FallbackScorer::new(config, &vendors)),
                    UrgencyClassifier::substring(config),
                )
            }
        };

        Self {
            engine,
            urgency,
            matcher,
            weights: RelevanceWeights::default(),
            settings: config.scoring.clone(),
        }
    }

    fn compile(
        config: &IntelConfig,
        vendors: &[String],
    ) -> Result<(PatternTables, UrgencyClassifier)> {
        Ok((
            PatternTables::compile(config, vendors)?,
            UrgencyClassifier::compile(config)?,
        ))
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.engine, Engine::Fallback(_))
    }

    pub fn settings(&self) -> &ScoringSettings {
        &self.settings
    }

    pub fn urgency_classifier(&self) -> &UrgencyClassifier {
        &self.urgency
    }

    pub fn matcher(&self) -> Option<&Arc<AliasMatcher>> {
        self.matcher.as_ref()
    }

    pub fn calculate_relevance_score(&self, text: &str) -> f64 {
        self.score_breakdown(text).total
    }

    pub fn determine_content_urgency(&self, text: &str, score: f64) -> Urgency {
        self.urgency.classify(text, score)
    }

    pub fn score_breakdown(&self, text: &str) -> ScoreBreakdown {
        let matches = self.find_companies(text);
        self.breakdown_with_matches(text, matches.as_ref())
    }

    /// Score, urgency, vendors and match confidence in one pass.
    pub fn score(&self, text: &str) -> ContentScore {
        if text.trim().is_empty() {
            return ContentScore::empty();
        }

        let matches = self.find_companies(text);
        let relevance_score = self.breakdown_with_matches(text, matches.as_ref()).total;
        let urgency = self.urgency.classify(text, relevance_score);
        let (matched_companies, confidence) = matches
            .map(|m| (m.matched_companies, m.confidence_score))
            .unwrap_or_default();

        ContentScore {
            relevance_score,
            urgency,
            matched_companies,
            confidence,
        }
    }

    fn find_companies(&self, text: &str) -> Option<MatchResult> {
        self.matcher.as_ref().map(|m| m.find_companies_in_text(text))
    }

    fn breakdown_with_matches(&self, text: &str, matches: Option<&MatchResult>) -> ScoreBreakdown {
        if text.trim().is_empty() {
            return ScoreBreakdown {
                context_multiplier: 1.0,
                fallback: self.is_fallback(),
                ..Default::default()
            };
        }

        match &self.engine {
            Engine::Patterns(tables) => self.pattern_breakdown(tables, text, matches),
            Engine::Fallback(fallback) => {
                let total = fallback.score(text).max(0.0);
                ScoreBreakdown {
                    base_score: total,
                    context_multiplier: 1.0,
                    total,
                    fallback: true,
                    ..Default::default()
                }
            }
        }
    }

    fn pattern_breakdown(
        &self,
        t: &PatternTables,
        text: &str,
        matches: Option<&MatchResult>,
    ) -> ScoreBreakdown {
        let count = |n: usize| n as f64;
        let bonus = |hit: bool, value: f64| if hit { value } else { 0.0 };

        let pricing = count(t.pricing.count(text));
        let price_points = count(t.price_points.count(text));
        let margin = count(t.margin.count(text));
        let channel = count(t.channel.count(text));
        let vendors = count(t.vendors.count(text));
        let competitive = count(t.competitive.count(text));
        let ma = count(t.ma.count(text));
        let cnapp = count(t.cnapp.count(text));
        let urgency_high = count(t.urgency_high.count(text));
        let urgency_medium = count(t.urgency_medium.count(text));

        let immediate_revenue_impact = (pricing * PRICING_KEYWORD
            + price_points * PRICE_POINT
            + bonus(t.price_shock.is_match(text), PRICE_SHOCK_BONUS)
            + bonus(t.license_enforcement.is_match(text), LICENSE_ENFORCEMENT_BONUS))
        .min(SUB_SCORE_CAP);

        let margin_opportunity = (margin * MARGIN_KEYWORD
            + channel * CHANNEL_KEYWORD
            + bonus(t.partner_program.is_match(text), PARTNER_PROGRAM_BONUS))
        .min(SUB_SCORE_CAP);

        let competitive_advantage = (vendors * VENDOR_MENTION
            + competitive * COMPETITIVE_KEYWORD
            + bonus(t.migration.is_match(text), MIGRATION_BONUS))
        .min(SUB_SCORE_CAP);

        let strategic_value = (ma * MA_KEYWORD
            + cnapp * CNAPP_KEYWORD
            + bonus(t.acquisition.is_match(text), ACQUISITION_BONUS))
        .min(SUB_SCORE_CAP);

        let urgency_factor = (urgency_high * URGENCY_HIGH_KEYWORD
            + urgency_medium * URGENCY_MEDIUM_KEYWORD
            + bonus(t.deadline.is_match(text), DEADLINE_BONUS))
        .min(SUB_SCORE_CAP);

        let w = &self.weights;
        let base_score = immediate_revenue_impact * w.immediate_revenue_impact
            + margin_opportunity * w.margin_opportunity
            + competitive_advantage * w.competitive_advantage
            + strategic_value * w.strategic_value
            + urgency_factor * w.urgency_factor;

        let context_multiplier = if t.msp_context.is_match(text) {
            MSP_CONTEXT_MULTIPLIER
        } else {
            1.0
        };

        let acquired_mentions = matches
            .map(|m| m.acquisition_mappings.len() as f64)
            .unwrap_or(0.0);

        let ma_boost = (ma * 1.5 + count(t.acquisition.count(text)) * 2.0 + acquired_mentions)
            .min(MA_BOOST_CAP);

        let cloud_security_boost =
            (cnapp * 1.0 + count(t.cloud_security.count(text)) * 1.5).min(CLOUD_SECURITY_BOOST_CAP);

        let business_context_boost = (count(t.business_context.count(text)) * 2.0
            + channel * 0.5
            + margin * 0.5)
            .min(BUSINESS_CONTEXT_BOOST_CAP);

        let total = (base_score * context_multiplier
            + ma_boost
            + cloud_security_boost
            + business_context_boost)
            .max(0.0);

        ScoreBreakdown {
            immediate_revenue_impact,
            margin_opportunity,
            competitive_advantage,
            strategic_value,
            urgency_factor,
            base_score,
            context_multiplier,
            ma_boost,
            cloud_security_boost,
            business_context_boost,
            total,
            fallback: false,
        }
    }
}
