use crate::models::ScoredItem;

pub struct ItemBatcher {
    max_tokens: usize,
    reserved_tokens: usize,
    max_items_per_batch: usize,
}

impl ItemBatcher {
    pub fn new(max_tokens: usize) -> Self {
        Self {
            max_tokens,
            // Reserve tokens for system prompt (~1000) and response (~4000)
            reserved_tokens: 5_000,
            max_items_per_batch: 8,
        }
    }

    pub fn with_max_items(mut self, max_items_per_batch: usize) -> Self {
        self.max_items_per_batch = max_items_per_batch.max(1);
        self
    }

    /// Groups items in order; an item too large for any batch is truncated
    /// and sent alone.
    pub fn create_batches(&self, items: Vec<ScoredItem>) -> Vec<Vec<ScoredItem>> {
        let available_tokens = self.max_tokens.saturating_sub(self.reserved_tokens);
        let mut batches = Vec::new();
        let mut current_batch = Vec::new();
        let mut current_tokens = 0;

        for item in items {
            let item_tokens = self.estimate_item_tokens(&item);

            if item_tokens > available_tokens {
                let truncated = self.truncate_item(item, available_tokens);
                if !current_batch.is_empty() {
                    batches.push(std::mem::take(&mut current_batch));
                    current_tokens = 0;
                }
                batches.push(vec![truncated]);
                continue;
            }

            if current_tokens + item_tokens > available_tokens
                || current_batch.len() >= self.max_items_per_batch
            {
                if !current_batch.is_empty() {
                    batches.push(std::mem::take(&mut current_batch));
                }
                current_tokens = 0;
            }

            current_tokens += item_tokens;
            current_batch.push(item);
        }

        if !current_batch.is_empty() {
            batches.push(current_batch);
        }

        batches
    }

    fn estimate_item_tokens(&self, item: &ScoredItem) -> usize {
        let char_count = item.item.title.len() + item.item.body().len() + item.item.url.len();
        // Add overhead for formatting
        (char_count / 4) + 60
    }

    fn truncate_item(&self, mut item: ScoredItem, max_tokens: usize) -> ScoredItem {
        let overhead = item.item.title.len() + item.item.url.len() + 240;
        let max_chars = (max_tokens * 4).saturating_sub(overhead);
        let body: String = item.item.body().chars().take(max_chars).collect();
        item.item.content = format!("{}\n... [truncated]", body);
        item.item.text = None;
        item
    }
}

impl Default for ItemBatcher {
    fn default() -> Self {
        // Default to Claude's context window
        Self::new(200_000)
    }
}
