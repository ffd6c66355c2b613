//! CGA CLI - Content gap analysis from the command line
//!
//! Usage:
//!   cga analyze --page-url <url> --keyword <keyword>
//!   cga serp <keyword>
//!   cga entities <url>

mod output;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cga_core::{AppConfig, LoggingConfig, PageFetcher, ResultRetriever};
use cga_extractor::GoogleNlpClient;
use cga_gap::{GapAnalyzer, GapRequest};
use cga_parser::ArticleExtractor;
use cga_scrape::{CacheStats, CachedFetcher, HasDataClient};

use crate::output::{Formatter, OutputFormat};

#[derive(Parser)]
#[command(name = "cga")]
#[command(about = "Find entities that top-ranking pages cover and your page does not")]
#[command(version)]
struct Cli {
    /// Path to a TOML configuration file
    #[arg(long, global = true, env = "CGA_CONFIG")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Write output to a file instead of stdout
    #[arg(long, short, global = true)]
    output: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full content gap analysis
    Analyze {
        /// Page to audit
        #[arg(long)]
        page_url: String,

        /// Keyword whose search results are the competitor set
        #[arg(long)]
        keyword: String,

        /// Only show entities the page is missing
        #[arg(long)]
        missing_only: bool,

        /// Entities taken from each competitor page
        #[arg(long)]
        top_k: Option<usize>,

        /// Competitor pages processed at once
        #[arg(long)]
        concurrency: Option<usize>,

        /// Maximum number of search results to analyze
        #[arg(long)]
        max_results: Option<usize>,
    },
    /// List the organic search results for a keyword
    Serp {
        /// Search keyword
        keyword: String,
    },
    /// Show the entities found on a single page
    Entities {
        /// Page URL
        url: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref())?;
    init_tracing(&config.logging);

    let formatter = Formatter::new(cli.format, !cli.no_color);
    if cli.no_color {
        colored::control::set_override(false);
    }

    let rendered = match cli.command {
        Commands::Analyze {
            page_url,
            keyword,
            missing_only,
            top_k,
            concurrency,
            max_results,
        } => {
            if let Some(top_k) = top_k {
                config.analysis.top_k = top_k;
            }
            if let Some(concurrency) = concurrency {
                config.analysis.concurrency = concurrency;
            }
            if max_results.is_some() {
                config.analysis.max_results = max_results;
            }
            config.validate()?;

            let (gap, cache_stats) = build_analyzer(&config)?;
            let report = gap.run(&GapRequest::new(keyword, page_url)).await?;

            if let Some(stats) = cache_stats {
                let stats = stats.report();
                tracing::debug!(
                    "Page cache: {} hits, {} misses ({:.0}% hit rate)",
                    stats.hits,
                    stats.misses,
                    stats.hit_rate * 100.0
                );
            }

            formatter.format_report(&report, missing_only)?
        }
        Commands::Serp { keyword } => {
            let client = HasDataClient::from_config(&config.hasdata)?;
            let mut results = client.retrieve(&keyword).await?;
            if let Some(max) = config.analysis.max_results {
                results.truncate(max);
            }
            formatter.format_serp(&results)?
        }
        Commands::Entities { url } => {
            config.validate()?;

            let (gap, _) = build_analyzer(&config)?;
            let table = gap.analyze_target(&url).await;
            formatter.format_entities(&table)?
        }
    };

    match cli.output {
        Some(path) => {
            std::fs::write(&path, format!("{}\n", rendered))
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "{}",
                formatter.success(&format!("Wrote {}", path.display()))
            );
        }
        None => println!("{}", rendered),
    }

    Ok(())
}

/// File configuration with environment overrides, or environment only
fn load_config(path: Option<&Path>) -> anyhow::Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::from_file(path)?.with_env_override()?,
        None => AppConfig::from_env()?,
    };
    Ok(config)
}

/// Logs go to stderr so table and JSON output stay clean
fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.level.as_str()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_file(logging.include_location)
        .with_line_number(logging.include_location);

    if logging.json_format {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn build_analyzer(config: &AppConfig) -> anyhow::Result<(GapAnalyzer, Option<Arc<CacheStats>>)> {
    let hasdata = HasDataClient::from_config(&config.hasdata)?;
    let nlp = GoogleNlpClient::from_config(&config.nlp)?;

    let (fetcher, cache_stats): (Arc<dyn PageFetcher>, _) = if config.cache.enabled {
        let cached = CachedFetcher::new(hasdata.clone(), &config.cache);
        let stats = cached.stats();
        (Arc::new(cached), Some(stats))
    } else {
        (Arc::new(hasdata.clone()), None)
    };

    let gap = GapAnalyzer::new(
        Arc::new(hasdata),
        fetcher,
        Arc::new(ArticleExtractor::new()),
        Arc::new(nlp),
        config.analysis.clone(),
    );

    Ok((gap, cache_stats))
}
