use std::collections::BTreeMap;

use crate::models::{Insight, LLMInsight, Role, ScoredItem, Urgency};

const EXTRACT_CHARS: usize = 280;

/// Summary built from the item text alone, used when no LLM output exists.
pub fn extractive_insight(scored: &ScoredItem) -> Insight {
    let body = scored.item.body().split_whitespace().collect::<Vec<_>>().join(" ");
    let excerpt = if body.chars().count() > EXTRACT_CHARS {
        let cut: String = body.chars().take(EXTRACT_CHARS).collect();
        format!("{}...", cut.trim_end())
    } else if body.is_empty() {
        scored.item.title.clone()
    } else {
        body
    };

    let mut summaries = BTreeMap::new();
    summaries.insert(Role::Executive, excerpt);

    Insight {
        title: scored.item.title.clone(),
        url: scored.item.url.clone(),
        source: scored.item.source.clone(),
        vendor: scored.primary_vendor().map(|v| v.to_string()),
        urgency: scored.urgency,
        relevance_score: scored.relevance_score,
        summaries,
        key_points: Vec::new(),
        created_at: scored.item.created_at,
    }
}

/// Joins LLM output back onto its batch by `item_index`. Items the model
/// skipped, or referenced out of range, fall back to extractive summaries.
///
/// Urgency never drops below what the scorer assigned.
pub fn merge_insights(batch: &[ScoredItem], llm: Vec<LLMInsight>) -> Vec<Insight> {
    let mut by_index: BTreeMap<usize, LLMInsight> = BTreeMap::new();
    for insight in llm {
        if insight.item_index < batch.len() {
            by_index.entry(insight.item_index).or_insert(insight);
        } else {
            tracing::debug!("Dropping LLM insight with out-of-range index {}", insight.item_index);
        }
    }

    batch
        .iter()
        .enumerate()
        .map(|(index, scored)| {
            let mut insight = extractive_insight(scored);
            let Some(llm) = by_index.remove(&index) else {
                return insight;
            };

            let summaries: BTreeMap<Role, String> = llm
                .summaries
                .into_iter()
                .filter(|(_, text)| !text.trim().is_empty())
                .map(|(role, text)| (Role::from(role.as_str()), text.trim().to_string()))
                .collect();
            if !summaries.is_empty() {
                insight.summaries = summaries;
            }

            if let Some(vendor) = llm.vendor.filter(|v| !v.trim().is_empty()) {
                insight.vendor = Some(vendor.trim().to_string());
            }
            if let Some(urgency) = llm.urgency.as_deref().map(Urgency::from) {
                insight.urgency = insight.urgency.max(urgency);
            }
            insight.key_points = llm.key_points;
            insight
        })
        .collect()
}
