use std::sync::Arc;

use pricing_intel::models::Urgency;
use pricing_intel::{AliasMatcher, IntelConfig, RelevanceScorer};

fn scorer() -> RelevanceScorer {
    let config = IntelConfig::builtin().unwrap();
    let matcher = Arc::new(AliasMatcher::builtin().unwrap());
    RelevanceScorer::new(&config, Some(matcher))
}

const SAMPLES: &[&str] = &[
    "",
    "   ",
    "Regular software maintenance update released",
    "Microsoft Azure pricing increased 15% affecting Office 365 Enterprise customers",
    "VMware announces the shutdown of its VCSP program affecting thousands of partners \
     with migration deadline in Oct 2025",
    "Broadcom acquisition of VMware doubles per-core pricing for MSPs; \
     partners scramble to migrate to Nutanix",
    "Wiz CNAPP pricing vs Palo Alto Prisma Cloud for MSSP margins",
    "!!! ??? ((( [[[ \\\\ $$$",
    "Sophos Datto Kaseya Veeam Fortinet Cisco Okta Splunk Citrix",
];

#[test]
fn test_builtin_tables_compile_without_fallback() {
    assert!(!scorer().is_fallback());
}

#[test]
fn test_score_is_never_negative() {
    let scorer = scorer();
    for text in SAMPLES {
        assert!(scorer.calculate_relevance_score(text) >= 0.0, "negative score for {:?}", text);
    }
}

#[test]
fn test_empty_text_scores_zero_and_low() {
    let scorer = scorer();
    assert_eq!(scorer.calculate_relevance_score(""), 0.0);
    assert_eq!(scorer.determine_content_urgency("", 0.0), Urgency::Low);
}

#[test]
fn test_ecosystem_shutdown_is_high_regardless_of_score() {
    let scorer = scorer();
    for text in [
        "The partner program shutdown was announced today",
        "What happens to VCSP partners now?",
    ] {
        for score in [0.0, 1.0, 100.0] {
            assert_eq!(scorer.determine_content_urgency(text, score), Urgency::High, "{}", text);
        }
    }
}

#[test]
fn test_vcsp_shutdown_scenario_is_high() {
    let scorer = scorer();
    let text = "VMware announces the shutdown of its VCSP program affecting thousands of \
                partners with migration deadline in Oct 2025";
    let score = scorer.calculate_relevance_score(text);
    assert!(score > 0.0);
    assert_eq!(scorer.determine_content_urgency(text, score), Urgency::High);
}

#[test]
fn test_routine_update_is_low() {
    let scorer = scorer();
    let text = "Regular software maintenance update released";
    let score = scorer.calculate_relevance_score(text);
    assert!(score < scorer.settings().medium_score_threshold);
    assert_eq!(scorer.determine_content_urgency(text, score), Urgency::Low);
}

#[test]
fn test_scoring_is_idempotent() {
    let scorer = scorer();
    for text in SAMPLES {
        assert_eq!(scorer.calculate_relevance_score(text), scorer.calculate_relevance_score(text));
        assert_eq!(scorer.score(text), scorer.score(text));
    }
}

#[test]
fn test_pricing_news_outscores_routine_update() {
    let scorer = scorer();
    let pricing = scorer.calculate_relevance_score(
        "Microsoft Azure pricing increased 15% affecting Office 365 Enterprise customers",
    );
    let routine = scorer.calculate_relevance_score("Regular software maintenance update released");
    assert!(pricing > routine);
}

#[test]
fn test_breakdown_total_matches_score() {
    let scorer = scorer();
    for text in SAMPLES {
        let breakdown = scorer.score_breakdown(text);
        assert_eq!(breakdown.total, scorer.calculate_relevance_score(text));
        for sub in [
            breakdown.immediate_revenue_impact,
            breakdown.margin_opportunity,
            breakdown.competitive_advantage,
            breakdown.strategic_value,
            breakdown.urgency_factor,
        ] {
            assert!((0.0..=10.0).contains(&sub));
        }
        assert!(breakdown.ma_boost <= 6.5);
        assert!(breakdown.cloud_security_boost <= 4.0);
        assert!(breakdown.business_context_boost <= 10.0);
    }
}

#[test]
fn test_score_reports_matched_companies() {
    let scorer = scorer();
    let score = scorer
        .score("Microsoft Azure pricing increased 15% affecting Office 365 Enterprise customers");
    assert!(score.matched_companies.contains("microsoft"));
    assert!(score.confidence > 0.2);
}
