use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use pricing_intel::digest::load_employees;
use pricing_intel::models::{AcquisitionIntelligence, Employee, MatchResult, Urgency};
use pricing_intel::pipeline::RunReport;
use pricing_intel::{
    AliasMatcher, ClaudeProvider, CompanyTable, Config, ContentPipeline, ContentSource,
    GoogleSource, IntelConfig, LLMProvider, PipelineConfig, RedditSource, RelevanceScorer,
    ScoreBreakdown, Storage,
};

#[derive(Parser, Debug)]
#[command(name = "pricing-intel")]
#[command(version = "0.1.0")]
#[command(about = "Score vendor pricing news and write role-targeted digests")]
struct Args {
    /// Keyword and pattern tables (YAML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Company alias and acquisition table
    #[arg(long)]
    companies: Option<PathBuf>,

    /// Employee roster CSV (name,email,role)
    #[arg(long)]
    employees: Option<PathBuf>,

    /// Directory for rendered digests
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Database path for seen items and insights
    #[arg(long)]
    database: Option<String>,

    /// Maximum items per digest
    #[arg(long)]
    max_items: Option<usize>,

    /// Skip the LLM and use extractive summaries
    #[arg(long)]
    dry_run: bool,

    /// Score a single text, print the breakdown and exit
    #[arg(long, value_name = "TEXT")]
    score: Option<String>,

    /// Output format (json, text, markdown)
    #[arg(short, long, default_value = "text")]
    format: String,
}

#[derive(serde::Serialize)]
struct ScoreReport {
    breakdown: ScoreBreakdown,
    urgency: Urgency,
    urgency_rule: &'static str,
    matches: MatchResult,
    acquisitions: AcquisitionIntelligence,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("pricing_intel=info".parse()?)
                .add_directive("reqwest=warn".parse()?),
        )
        .init();

    // Load environment variables
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = Config::from_env()?;

    // Load tables
    let mut intel = match args.config.as_ref().or(config.intel_config_path.as_ref()) {
        Some(path) => IntelConfig::from_path(path)?,
        None => IntelConfig::builtin()?,
    };
    if let Some(max_items) = args.max_items {
        intel.scoring.max_items = max_items.max(1);
    }
    let companies = match args.companies.as_ref().or(config.companies_path.as_ref()) {
        Some(path) => CompanyTable::from_path(path)?,
        None => CompanyTable::builtin()?,
    };
    let matcher = AliasMatcher::new(companies)?;
    tracing::info!("Loaded {} companies", matcher.table().len());

    let scorer = RelevanceScorer::new(&intel, Some(Arc::new(matcher)));

    if let Some(text) = &args.score {
        let (urgency, rule) = scorer
            .urgency_classifier()
            .classify_with_rule(text, scorer.calculate_relevance_score(text));
        let report = ScoreReport {
            breakdown: scorer.score_breakdown(text),
            urgency,
            urgency_rule: rule,
            matches: scorer
                .matcher()
                .map(|m| m.find_companies_in_text(text))
                .unwrap_or_default(),
            acquisitions: scorer
                .matcher()
                .map(|m| m.get_acquisition_intelligence(text))
                .unwrap_or_default(),
        };
        println!("{}", format_score(&report, &args.format)?);
        return Ok(());
    }

    // Build sources
    let mut sources: Vec<Arc<dyn ContentSource>> = vec![Arc::new(RedditSource::new(
        &config.reddit_user_agent,
        intel.sources.subreddits.clone(),
        &intel.sources.reddit_sort,
        intel.sources.reddit_limit,
    )?)];
    match (&config.google_api_key, &config.google_cse_id) {
        (Some(key), Some(cx)) => sources.push(Arc::new(GoogleSource::new(
            key.clone(),
            cx.clone(),
            intel.sources.google_queries.clone(),
            intel.sources.google_results,
        )?)),
        _ => tracing::info!("GOOGLE_API_KEY or GOOGLE_CSE_ID not set, Google source disabled"),
    }

    let llm: Option<Arc<dyn LLMProvider>> = match &config.anthropic_api_key {
        Some(key) => Some(Arc::new(ClaudeProvider::new(key.clone(), None)?)),
        None => {
            tracing::info!("ANTHROPIC_API_KEY not set, using extractive summaries");
            None
        }
    };

    let employees_path = args.employees.clone().unwrap_or_else(|| config.employees_path.clone());
    let employees: Vec<Employee> = if employees_path.exists() {
        load_employees(&employees_path)?
    } else {
        tracing::warn!("Employee roster {} not found", employees_path.display());
        Vec::new()
    };

    let storage = Storage::new(args.database.as_deref().unwrap_or(&config.database_path))?;

    let mut pipeline_config = PipelineConfig::new(&config, &intel);
    if let Some(dir) = &args.output_dir {
        pipeline_config.output_dir = dir.clone();
    }
    pipeline_config.dry_run |= args.dry_run;

    let mut pipeline = ContentPipeline::new(sources, scorer, llm, storage, pipeline_config);

    tracing::info!("Starting pricing intelligence run");
    let report = pipeline.run(&employees).await?;

    println!("{}", format_run(&report, &args.format)?);
    Ok(())
}

fn format_score(report: &ScoreReport, format: &str) -> anyhow::Result<String> {
    let b = &report.breakdown;
    let companies: Vec<&str> =
        report.matches.matched_companies.iter().map(|s| s.as_str()).collect();
    let chains: Vec<String> = report
        .acquisitions
        .acquisition_chains
        .iter()
        .map(|c| c.path.join(" -> "))
        .collect();

    Ok(match format {
        "json" => serde_json::to_string_pretty(report)?,
        "markdown" => {
            let mut out = String::from("# Relevance Score\n\n");
            out.push_str("| Component | Value |\n|-----------|-------|\n");
            for (name, value) in breakdown_rows(b) {
                out.push_str(&format!("| {} | {:.2} |\n", name, value));
            }
            out.push_str(&format!(
                "\n**Urgency:** {} (rule: `{}`)\n\n**Companies:** {}\n\n**Confidence:** {:.2}\n",
                report.urgency,
                report.urgency_rule,
                if companies.is_empty() { "none".to_string() } else { companies.join(", ") },
                report.matches.confidence_score
            ));
            if !chains.is_empty() {
                out.push_str("\n## Acquisition Chains\n\n");
                for chain in &chains {
                    out.push_str(&format!("- {}\n", chain));
                }
            }
            out
        }
        _ => {
            let mut out = String::from("\n=== Relevance Score ===\n\n");
            for (name, value) in breakdown_rows(b) {
                out.push_str(&format!("  {:<26} {:>7.2}\n", name, value));
            }
            if b.fallback {
                out.push_str("  (fallback scorer)\n");
            }
            out.push_str(&format!(
                "\nUrgency: {} (rule: {})\n",
                report.urgency, report.urgency_rule
            ));
            out.push_str(&format!(
                "Companies: {}\n",
                if companies.is_empty() { "none".to_string() } else { companies.join(", ") }
            ));
            out.push_str(&format!("Confidence: {:.2}\n", report.matches.confidence_score));
            for chain in &chains {
                out.push_str(&format!("Acquisition: {}\n", chain));
            }
            out
        }
    })
}

fn breakdown_rows(b: &ScoreBreakdown) -> [(&'static str, f64); 11] {
    [
        ("Immediate revenue impact", b.immediate_revenue_impact),
        ("Margin opportunity", b.margin_opportunity),
        ("Competitive advantage", b.competitive_advantage),
        ("Strategic value", b.strategic_value),
        ("Urgency factor", b.urgency_factor),
        ("Base score", b.base_score),
        ("Context multiplier", b.context_multiplier),
        ("M&A boost", b.ma_boost),
        ("Cloud security boost", b.cloud_security_boost),
        ("Business context boost", b.business_context_boost),
        ("Total", b.total),
    ]
}

fn format_run(report: &RunReport, format: &str) -> anyhow::Result<String> {
    Ok(match format {
        "json" => serde_json::to_string_pretty(&report.insights)?,
        "markdown" => {
            let mut out = String::from("# Pricing Intelligence Run\n\n");
            out.push_str("| Metric | Value |\n|--------|-------|\n");
            out.push_str(&format!("| Fetched | {} |\n", report.fetched));
            out.push_str(&format!("| Relevant | {} |\n", report.relevant));
            out.push_str(&format!("| Duplicates | {} |\n", report.duplicates));
            out.push_str(&format!("| Reported | {} |\n", report.insights.len()));
            out.push_str("\n## Insights\n\n");
            for insight in &report.insights {
                out.push_str(&format!(
                    "- **[{}]** [{}]({}) ({:.1})\n",
                    insight.urgency, insight.title, insight.url, insight.relevance_score
                ));
            }
            out
        }
        _ => {
            let mut out = format!(
                "\nFetched {} items, {} relevant, {} duplicates, {} reported\n\n",
                report.fetched,
                report.relevant,
                report.duplicates,
                report.insights.len()
            );
            for insight in &report.insights {
                out.push_str(&format!(
                    "  [{:<6}] {:>6.1}  {}\n",
                    insight.urgency.to_string(),
                    insight.relevance_score,
                    insight.title
                ));
            }
            for path in &report.digests {
                out.push_str(&format!("\nDigest: {}", path.display()));
            }
            out
        }
    })
}
