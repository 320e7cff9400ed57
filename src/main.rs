//! DeepCrawl main entry point
//!
//! This is the command-line interface for the DeepCrawl deep-crawl engine.

use anyhow::Context;
use clap::Parser;
use deepcrawl::config::{load_config_with_hash, Config, FilterSpec};
use deepcrawl::crawler::{HtmlLinkExtractor, HttpFetcher};
use deepcrawl::output::{print_result, print_summary};
use deepcrawl::{normalize_url, CancelHandle, DeepCrawler, StrategyKind};
use futures::StreamExt;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// DeepCrawl: explore the link graph reachable from a seed URL
///
/// Pages are visited breadth-first, depth-first or best-first under depth,
/// page-count and relevance limits. Each result is printed as it is
/// produced (with --stream) or once the crawl ends, followed by a summary.
#[derive(Parser, Debug)]
#[command(name = "deepcrawl")]
#[command(version)]
#[command(about = "A deep-crawl engine", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// URL to start crawling from
    #[arg(value_name = "SEED_URL")]
    seed: String,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Print results as they arrive instead of after the crawl
    #[arg(long)]
    stream: bool,

    /// Validate config and show the crawl plan without crawling
    #[arg(long)]
    dry_run: bool,

    /// Override the configured strategy (bfs, dfs, best-first)
    #[arg(long, value_name = "STRATEGY")]
    strategy: Option<StrategyKind>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(strategy) = cli.strategy {
        config.crawl.strategy = strategy;
    }
    if cli.stream {
        config.crawl.stream = true;
    }

    if cli.dry_run {
        handle_dry_run(&config, &cli.seed)
    } else {
        handle_crawl(config, &cli.seed).await
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("deepcrawl=info,warn"),
            1 => EnvFilter::new("deepcrawl=debug,info"),
            2 => EnvFilter::new("deepcrawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Handles the --dry-run mode: validates config and shows the crawl plan
fn handle_dry_run(config: &Config, seed: &str) -> anyhow::Result<()> {
    let seed = normalize_url(seed).context("invalid seed URL")?;
    let chain = config.filter_chain()?;
    let scorer = config.scorer();

    let crawl = &config.crawl;
    println!("=== DeepCrawl Dry Run ===\n");

    println!("Seed: {}", seed);

    println!("\nCrawl Configuration:");
    println!("  Strategy: {}", crawl.strategy);
    println!("  Max depth: {}", crawl.max_depth);
    match crawl.max_pages {
        Some(max_pages) => println!("  Max pages: {}", max_pages),
        None => println!("  Max pages: unbounded"),
    }
    println!("  Include external: {}", crawl.include_external);
    match crawl.score_threshold {
        Some(threshold) => println!("  Score threshold: {}", threshold),
        None => println!("  Score threshold: none"),
    }
    println!("  Fetch concurrency: {}", crawl.fetch_concurrency);
    println!("  Per-page timeout: {}ms", crawl.per_page_timeout_ms);
    println!("  Cancel grace: {}ms", crawl.cancel_grace().as_millis());
    if let Some(timeout) = crawl.crawl_timeout_ms {
        println!("  Crawl timeout: {}ms", timeout);
    }
    println!(
        "  Delivery: {}",
        if crawl.stream {
            format!("stream (buffer {})", crawl.stream_buffer)
        } else {
            "batch".to_string()
        }
    );
    println!("  Content-type policy: {:?}", crawl.content_type_policy);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nFilters ({}):", chain.len());
    for spec in &config.filters {
        println!("  - {}", describe_filter(spec));
    }

    match &config.scorer {
        Some(scorer_config) => {
            println!("\nScorer:");
            if !scorer_config.keywords.is_empty() {
                println!(
                    "  Keywords: {} (weight {})",
                    scorer_config.keywords.join(", "),
                    scorer_config.keyword_weight
                );
            }
            if let Some(optimal) = scorer_config.optimal_depth {
                println!(
                    "  Path depth: optimal {} (weight {})",
                    optimal, scorer_config.path_depth_weight
                );
            }
            if scorer_config.freshness_weight > 0.0 {
                println!("  Freshness weight: {}", scorer_config.freshness_weight);
            }
            if scorer_config.domain_authority_weight > 0.0 {
                println!(
                    "  Domain authority: {} domains (weight {})",
                    scorer_config.domain_weights.len(),
                    scorer_config.domain_authority_weight
                );
            }
        }
        None => println!("\nScorer: none (all links score 0)"),
    }

    println!("\n✓ Configuration is valid");
    if scorer.is_none() && crawl.score_threshold.is_some() {
        println!("! score-threshold is ignored without a scorer");
    }

    Ok(())
}

fn describe_filter(spec: &FilterSpec) -> String {
    match spec {
        FilterSpec::UrlPattern { patterns, reverse } => format!(
            "url-pattern {}[{}]",
            if *reverse { "exclude " } else { "" },
            patterns.join(", ")
        ),
        FilterSpec::Domain { allowed, blocked } => format!(
            "domain allowed [{}] blocked [{}]",
            allowed.join(", "),
            blocked.join(", ")
        ),
        FilterSpec::ContentType { allowed } => {
            format!("content-type [{}] (page stage)", allowed.join(", "))
        }
        FilterSpec::Quality { threshold } => format!("quality >= {}", threshold),
        FilterSpec::Relevance { query, threshold } => {
            format!("relevance to \"{}\" >= {}", query, threshold)
        }
    }
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, seed: &str) -> anyhow::Result<()> {
    let fetcher = HttpFetcher::new(&config.user_agent, config.crawl.per_page_timeout())
        .context("failed to build HTTP client")?;

    let mut crawler = DeepCrawler::new(config.crawl.clone(), fetcher, HtmlLinkExtractor::new())
        .with_filter_chain(config.filter_chain()?);
    if let Some(scorer) = config.scorer() {
        crawler = crawler.with_shared_scorer(scorer);
    }

    if config.crawl.stream {
        let mut stream = crawler.crawl_stream(seed)?;
        cancel_on_ctrl_c(stream.cancel_handle());

        while let Some(result) = stream.next().await {
            print_result(&result);
        }

        let summary = stream.finish().await?;
        println!();
        print_summary(&summary);
    } else {
        let cancel = CancelHandle::new();
        cancel_on_ctrl_c(cancel.clone());

        let (results, summary) = crawler.crawl_with_cancel(seed, cancel).await?;
        for result in &results {
            print_result(result);
        }
        println!();
        print_summary(&summary);
    }

    Ok(())
}

fn cancel_on_ctrl_c(cancel: CancelHandle) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping crawl");
            cancel.cancel();
        }
    });
}
