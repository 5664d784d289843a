use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};
use sha2::{Digest, Sha256};
use tokio::sync::Semaphore;

use crate::config::PipelineConfig;
use crate::digest::{digest_file_name, recipients_by_role, render_digest};
use crate::error::Result;
use crate::llm::{extractive_insight, merge_insights, ItemBatcher, LLMProvider, SummaryRequest};
use crate::models::{ContentItem, Employee, Insight, Role, ScoredItem};
use crate::scoring::RelevanceScorer;
use crate::sources::ContentSource;
use crate::storage::Storage;
use crate::text::normalize_phrase;

/// Outcome of one pipeline run.
#[derive(Debug, Default)]
pub struct RunReport {
    pub fetched: usize,
    pub relevant: usize,
    pub duplicates: usize,
    pub insights: Vec<Insight>,
    pub digests: Vec<PathBuf>,
}

pub struct ContentPipeline {
    sources: Vec<Arc<dyn ContentSource>>,
    scorer: RelevanceScorer,
    llm: Option<Arc<dyn LLMProvider>>,
    batcher: ItemBatcher,
    storage: Storage,
    config: PipelineConfig,
}

impl ContentPipeline {
    pub fn new(
        sources: Vec<Arc<dyn ContentSource>>,
        scorer: RelevanceScorer,
        llm: Option<Arc<dyn LLMProvider>>,
        storage: Storage,
        config: PipelineConfig,
    ) -> Self {
        let llm = if config.dry_run { None } else { llm };
        let batcher = match &llm {
            Some(provider) => ItemBatcher::new(provider.max_context_tokens()),
            None => ItemBatcher::default(),
        };
        Self {
            sources,
            scorer,
            llm,
            batcher,
            storage,
            config,
        }
    }

    pub fn scorer(&self) -> &RelevanceScorer {
        &self.scorer
    }

    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    pub async fn run(&mut self, employees: &[Employee]) -> Result<RunReport> {
        let mut report = RunReport::default();

        // Step 1: Fetch every source concurrently
        let items = self.fetch_all().await;
        report.fetched = items.len();
        tracing::info!("Fetched {} items from {} sources", items.len(), self.sources.len());

        // Step 2-3: Score and keep anything relevant
        let scored = self.score_items(items);
        report.relevant = scored.len();
        tracing::info!("{} items scored above zero", scored.len());

        // Step 4: Deduplicate within the run and against earlier runs
        let unique = self.deduplicate(scored)?;
        report.duplicates = report.relevant - unique.len();

        // Step 5: Rank and cap
        let ranked = rank_items(unique, self.config.max_items);
        if ranked.is_empty() {
            tracing::warn!("No new relevant items this run");
        }

        // Step 6: Summarize
        let insights = self.summarize(&ranked).await;
        self.storage.save_insights(&insights)?;
        for item in &ranked {
            self.storage.mark_seen(&item.fingerprint, &item.item.url, &item.item.title)?;
            self.storage
                .mark_seen(&url_fingerprint(&item.item.url), &item.item.url, &item.item.title)?;
        }

        // Step 7: Render digests
        report.digests = self.write_digests(&insights, employees, Utc::now().date_naive())?;
        report.insights = insights;

        Ok(report)
    }

    async fn fetch_all(&self) -> Vec<ContentItem> {
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency_limit));
        let pb = progress_bar(self.sources.len() as u64, "sources");

        let fetches = self.sources.iter().map(|source| {
            let source = source.clone();
            let sem = semaphore.clone();
            let pb = pb.clone();
            async move {
                let _permit = sem.acquire().await.ok()?;
                let result = source.fetch().await;
                pb.inc(1);
                match result {
                    Ok(items) => Some(items),
                    Err(e) => {
                        tracing::warn!("Source {} failed: {}", source.name(), e);
                        None
                    }
                }
            }
        });

        let results = join_all(fetches).await;
        pb.finish_with_message("Fetched all sources");
        results.into_iter().flatten().flatten().collect()
    }

    /// Scores items and keeps those with a positive relevance score.
    pub fn score_items(&self, items: Vec<ContentItem>) -> Vec<ScoredItem> {
        items
            .into_iter()
            .filter_map(|item| {
                let score = self.scorer.score(&item.scoring_text());
                if score.relevance_score > 0.0 {
                    let fingerprint = content_fingerprint(&item);
                    Some(ScoredItem::new(item, score, fingerprint))
                } else {
                    None
                }
            })
            .collect()
    }

    /// Keeps the highest-scoring copy of each URL or body, and drops items
    /// already recorded by an earlier run.
    pub fn deduplicate(&self, mut items: Vec<ScoredItem>) -> Result<Vec<ScoredItem>> {
        items.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));

        let mut seen = HashSet::new();
        let mut unique = Vec::with_capacity(items.len());
        for item in items {
            let by_url = url_fingerprint(&item.item.url);
            let fresh_in_run = seen.insert(item.fingerprint.clone()) & seen.insert(by_url.clone());
            if !fresh_in_run {
                tracing::debug!("Duplicate within run: {}", item.item.url);
                continue;
            }
            if self.storage.is_seen(&item.fingerprint)? || self.storage.is_seen(&by_url)? {
                tracing::debug!("Already reported: {}", item.item.url);
                continue;
            }
            unique.push(item);
        }
        Ok(unique)
    }

    async fn summarize(&self, items: &[ScoredItem]) -> Vec<Insight> {
        let Some(llm) = &self.llm else {
            tracing::info!("Summarizing {} items without an LLM", items.len());
            return items.iter().map(extractive_insight).collect();
        };

        let batches = self.batcher.create_batches(items.to_vec());
        tracing::info!("Created {} batches for {}", batches.len(), llm.name());
        let pb = progress_bar(batches.len() as u64, "batches");

        let mut insights = Vec::with_capacity(items.len());
        for batch in batches {
            let request = SummaryRequest::new(batch.clone(), Role::ALL.to_vec());
            match llm.summarize(request).await {
                Ok(llm_insights) => insights.extend(merge_insights(&batch, llm_insights)),
                Err(e) => {
                    tracing::warn!("LLM summary failed for batch, using extracts: {}", e);
                    insights.extend(batch.iter().map(extractive_insight));
                }
            }
            pb.inc(1);
        }

        pb.finish_with_message("Summaries complete");
        insights
    }

    fn write_digests(
        &self,
        insights: &[Insight],
        employees: &[Employee],
        date: NaiveDate,
    ) -> Result<Vec<PathBuf>> {
        std::fs::create_dir_all(&self.config.output_dir)?;

        let by_role = recipients_by_role(employees);
        let roles: Vec<(Role, usize)> = if by_role.is_empty() {
            tracing::warn!("Employee roster is empty, writing the executive digest only");
            vec![(Role::Executive, 0)]
        } else {
            by_role.iter().map(|(role, people)| (*role, people.len())).collect()
        };

        let mut paths = Vec::with_capacity(roles.len());
        for (role, recipients) in roles {
            let path = self.config.output_dir.join(digest_file_name(role, date));
            std::fs::write(&path, render_digest(role, date, insights))?;
            self.storage.record_digest(date, role, recipients, &path)?;
            tracing::info!(
                "Wrote {} digest for {} recipient(s): {}",
                role,
                recipients,
                path.display()
            );
            paths.push(path);
        }
        Ok(paths)
    }
}

/// Sorts by score, then urgency, then title, and keeps the top `max_items`.
pub fn rank_items(mut items: Vec<ScoredItem>, max_items: usize) -> Vec<ScoredItem> {
    items.sort_by(|a, b| {
        b.relevance_score
            .total_cmp(&a.relevance_score)
            .then_with(|| b.urgency.cmp(&a.urgency))
            .then_with(|| a.item.title.cmp(&b.item.title))
    });
    items.truncate(max_items);
    items
}

pub fn content_fingerprint(item: &ContentItem) -> String {
    let normalized = format!(
        "{}\n{}",
        normalize_phrase(&item.title),
        normalize_phrase(item.body())
    );
    sha256_hex(&normalized)
}

pub fn url_fingerprint(url: &str) -> String {
    sha256_hex(&normalize_url(url))
}

fn normalize_url(url: &str) -> String {
    let url = url.trim().to_lowercase();
    let url = url.split('#').next().unwrap_or_default();
    let url = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .unwrap_or(url);
    let url = url.strip_prefix("www.").unwrap_or(url);
    url.trim_end_matches('/').to_string()
}

fn sha256_hex(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    format!("{:x}", hasher.finalize())
}

fn progress_bar(len: u64, unit: &str) -> ProgressBar {
    let pb = ProgressBar::new(len);
    let template = format!(
        "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {}",
        unit
    );
    let style = ProgressStyle::default_bar()
        .template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-");
    pb.set_style(style);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::companies::AliasMatcher;
    use crate::config::IntelConfig;
    use crate::error::Error;
    use crate::models::Urgency;
    use async_trait::async_trait;

    struct StaticSource(Vec<ContentItem>);

    #[async_trait]
    impl ContentSource for StaticSource {
        async fn fetch(&self) -> Result<Vec<ContentItem>> {
            Ok(self.0.clone())
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    struct FailingSource;

    #[async_trait]
    impl ContentSource for FailingSource {
        async fn fetch(&self) -> Result<Vec<ContentItem>> {
            Err(Error::RedditApi("boom".into()))
        }

        fn name(&self) -> &str {
            "failing"
        }
    }

    struct CannedProvider;

    #[async_trait]
    impl LLMProvider for CannedProvider {
        async fn summarize(
            &self,
            request: SummaryRequest,
        ) -> Result<Vec<crate::models::LLMInsight>> {
            Ok((0..request.items.len())
                .map(|item_index| crate::models::LLMInsight {
                    item_index,
                    vendor: Some("Broadcom".into()),
                    urgency: Some("medium".into()),
                    summaries: [("sales".to_string(), "Call VCSP customers this week".to_string())]
                        .into_iter()
                        .collect(),
                    key_points: vec!["VCSP ends".into()],
                })
                .collect())
        }

        fn max_context_tokens(&self) -> usize {
            100_000
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    fn scorer() -> RelevanceScorer {
        let config = IntelConfig::builtin().unwrap();
        let matcher = Arc::new(AliasMatcher::builtin().unwrap());
        RelevanceScorer::new(&config, Some(matcher))
    }

    fn pipeline(sources: Vec<Arc<dyn ContentSource>>, output_dir: PathBuf) -> ContentPipeline {
        let config = PipelineConfig {
            concurrency_limit: 2,
            max_items: 10,
            output_dir,
            dry_run: true,
        };
        ContentPipeline::new(sources, scorer(), None, Storage::in_memory().unwrap(), config)
    }

    fn items() -> Vec<ContentItem> {
        vec![
            ContentItem::new(
                "reddit",
                "Broadcom ends VMware VCSP program",
                "Partners face a price increase and license enforcement before the deadline.",
                "https://www.reddit.com/r/msp/1/",
            ),
            ContentItem::new(
                "google",
                "Broadcom ends VMware VCSP program",
                "Partners face a price increase and license enforcement before the deadline.",
                "https://news.example.com/vcsp",
            ),
            ContentItem::new(
                "reddit",
                "Weekend plans",
                "Going hiking.",
                "https://www.reddit.com/r/msp/2/",
            ),
        ]
    }

    #[test]
    fn test_normalize_url_ignores_scheme_www_and_slash() {
        assert_eq!(
            url_fingerprint("https://www.Reddit.com/r/msp/1/"),
            url_fingerprint("http://reddit.com/r/msp/1#comments")
        );
    }

    #[test]
    fn test_rank_items_orders_and_caps() {
        let make = |title: &str, score: f64, urgency: Urgency| {
            let mut s = ScoredItem::new(
                ContentItem::new("r", title, "", "u"),
                crate::models::ContentScore::empty(),
                title.to_string(),
            );
            s.relevance_score = score;
            s.urgency = urgency;
            s
        };
        let ranked = rank_items(
            vec![
                make("b", 5.0, Urgency::Low),
                make("a", 5.0, Urgency::Low),
                make("c", 5.0, Urgency::High),
                make("d", 9.0, Urgency::Low),
            ],
            3,
        );
        let titles: Vec<&str> = ranked.iter().map(|s| s.item.title.as_str()).collect();
        assert_eq!(titles, vec!["d", "c", "a"]);
    }

    #[test]
    fn test_score_and_deduplicate_drop_irrelevant_and_copies() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = pipeline(vec![], dir.path().to_path_buf());
        let scored = pipeline.score_items(items());
        assert_eq!(scored.len(), 2);

        let unique = pipeline.deduplicate(scored).unwrap();
        assert_eq!(unique.len(), 1);
    }

    #[tokio::test]
    async fn test_run_writes_digests_and_skips_seen_items() {
        let dir = tempfile::tempdir().unwrap();
        let sources: Vec<Arc<dyn ContentSource>> =
            vec![Arc::new(StaticSource(items())), Arc::new(FailingSource)];
        let mut pipeline = pipeline(sources, dir.path().to_path_buf());
        let employees = vec![Employee {
            name: "Sam".into(),
            email: "sam@example.com".into(),
            role: Role::Sales,
        }];

        let report = pipeline.run(&employees).await.unwrap();
        assert_eq!(report.fetched, 3);
        assert_eq!(report.insights.len(), 1);
        assert_eq!(report.insights[0].urgency, Urgency::High);
        assert_eq!(report.digests.len(), 1);
        let html = std::fs::read_to_string(&report.digests[0]).unwrap();
        assert!(html.contains("Broadcom ends VMware VCSP program"));

        let second = pipeline.run(&employees).await.unwrap();
        assert!(second.insights.is_empty());
    }

    #[tokio::test]
    async fn test_run_merges_llm_summaries() {
        let dir = tempfile::tempdir().unwrap();
        let config = PipelineConfig {
            concurrency_limit: 1,
            max_items: 10,
            output_dir: dir.path().to_path_buf(),
            dry_run: false,
        };
        let sources: Vec<Arc<dyn ContentSource>> = vec![Arc::new(StaticSource(items()))];
        let llm: Arc<dyn LLMProvider> = Arc::new(CannedProvider);
        let storage = Storage::in_memory().unwrap();
        let mut pipeline = ContentPipeline::new(sources, scorer(), Some(llm), storage, config);

        let report = pipeline.run(&[]).await.unwrap();
        assert_eq!(report.insights.len(), 1);
        let insight = &report.insights[0];
        assert_eq!(insight.vendor.as_deref(), Some("Broadcom"));
        assert_eq!(insight.urgency, Urgency::High);
        assert_eq!(insight.summary_for(Role::Sales), Some("Call VCSP customers this week"));
        assert_eq!(report.digests.len(), 1);
        let expected = digest_file_name(Role::Executive, Utc::now().date_naive());
        assert!(report.digests[0].ends_with(expected));
    }
}
