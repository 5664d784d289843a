use crate::models::{Role, ScoredItem};

pub const SYSTEM_PROMPT: &str = r#"You are a channel pricing analyst for a managed service provider.
Your task is to turn vendor news and community posts into short, role-targeted intelligence.

You must respond with a valid JSON array matching this exact schema:
[
    {
        "item_index": 0,
        "vendor": "canonical vendor name or null",
        "urgency": "high|medium|low",
        "summaries": {
            "executive": "2-3 sentences on strategic and revenue impact",
            "sales": "2-3 sentences on customer conversations and positioning",
            "procurement": "2-3 sentences on contracts, renewals and negotiation",
            "technical": "2-3 sentences on migration and platform impact"
        },
        "key_points": ["short factual bullet"]
    }
]

Guidelines:
- Return exactly one object per item, using the item's index
- Only state facts present in the item; do not speculate on exact prices
- Name the affected vendor using its common company name
- Keep each summary under 60 words
- Urgency is high for shutdowns, deadlines and large price changes"#;

#[derive(Debug, Clone)]
pub struct SummaryRequest {
    pub items: Vec<ScoredItem>,
    pub roles: Vec<Role>,
}

/// Per-item body limit inside a prompt.
const MAX_BODY_CHARS: usize = 2_000;

impl SummaryRequest {
    pub fn new(items: Vec<ScoredItem>, roles: Vec<Role>) -> Self {
        Self { items, roles }
    }

    pub fn to_prompt(&self) -> String {
        let roles: Vec<String> = self
            .roles
            .iter()
            .map(|r| format!("{} ({})", r, r.focus()))
            .collect();

        let mut prompt = format!(
            "Summarize the following {} item(s) for these roles: {}.\n\n",
            self.items.len(),
            roles.join("; ")
        );

        for (index, scored) in self.items.iter().enumerate() {
            let item = &scored.item;
            prompt.push_str(&format!("## Item {}\n", index));
            prompt.push_str(&format!("Title: {}\n", item.title));
            prompt.push_str(&format!("Source: {} ({})\n", item.source, item.url));
            prompt.push_str(&format!(
                "Relevance: {:.1}, urgency: {}\n",
                scored.relevance_score, scored.urgency
            ));
            if !scored.matched_companies.is_empty() {
                let vendors: Vec<&str> =
                    scored.matched_companies.iter().map(|s| s.as_str()).collect();
                prompt.push_str(&format!("Detected vendors: {}\n", vendors.join(", ")));
            }

            let body = item.body();
            let body = if body.chars().count() > MAX_BODY_CHARS {
                let cut: String = body.chars().take(MAX_BODY_CHARS).collect();
                format!("{}...\n[truncated]", cut)
            } else {
                body.to_string()
            };
            prompt.push_str("```\n");
            prompt.push_str(&body);
            prompt.push_str("\n```\n\n");
        }

        prompt.push_str("\nProvide your summaries as a JSON array:\n");
        prompt
    }

    pub fn estimate_tokens(&self) -> usize {
        let char_count: usize = self
            .items
            .iter()
            .map(|s| {
                s.item.title.len() + s.item.body().len().min(MAX_BODY_CHARS) + s.item.url.len()
            })
            .sum();
        // Rough estimate: ~4 characters per token
        char_count / 4
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentItem, ContentScore};

    #[test]
    fn test_prompt_indexes_items_and_truncates() {
        let long = "x".repeat(MAX_BODY_CHARS + 50);
        let item = ContentItem::new("reddit", "Veeam licensing", &long, "https://r/1");
        let scored = ScoredItem::new(item, ContentScore::empty(), "fp".into());
        let request = SummaryRequest::new(vec![scored], vec![Role::Sales]);

        let prompt = request.to_prompt();
        assert!(prompt.contains("## Item 0"));
        assert!(prompt.contains("sales ("));
        assert!(prompt.contains("[truncated]"));
    }
}
