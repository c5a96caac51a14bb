use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use adlens_common::AppConfig;
use adlens_creative::{ad_id_of, CreativeResolver, DetailPageFallback, HttpImageFetcher};
use adlens_search::{
    ActiveStatus, AdSearchQuery, AdSearchRunner, ApifyAdScraper, DateRange, ScraperLookup,
};

#[derive(Parser)]
#[command(name = "adlens", about = "Ads library search and creative extraction")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Search the ads library for a domain and resolve each ad's creative
    Search {
        domain: String,

        #[arg(long, default_value_t = 10)]
        count: u32,

        #[arg(long, default_value = "US")]
        country: String,

        /// Match the domain as an exact phrase
        #[arg(long)]
        exact: bool,

        #[arg(long, default_value = "active")]
        status: ActiveStatus,

        /// Earliest ad start date (YYYY-MM-DD)
        #[arg(long, requires = "to")]
        from: Option<String>,

        /// Latest ad start date (YYYY-MM-DD)
        #[arg(long, requires = "from")]
        to: Option<String>,
    },

    /// Rank creative candidates in a saved scraper dataset without fetching
    Candidates {
        /// JSON file holding one item or an array of items
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.json_logs);

    match cli.command {
        Command::Search {
            domain,
            count,
            country,
            exact,
            status,
            from,
            to,
        } => {
            let date_range = match (from, to) {
                (Some(from), Some(to)) => Some(DateRange::parse(&from, &to)?),
                _ => None,
            };
            let query = AdSearchQuery::new(domain)
                .count(count)
                .country(country)
                .exact_phrase(exact)
                .active_status(status)
                .date_range(date_range);
            search(&query).await
        }
        Command::Candidates { file } => candidates(&file),
    }
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn search(query: &AdSearchQuery) -> Result<()> {
    let config = AppConfig::from_env()?;
    tracing::info!(domain = %query.domain, url = %query.library_url(), "Starting ad search");

    let scraper = Arc::new(ApifyAdScraper::from_config(&config));
    let fallback = DetailPageFallback::new(Arc::new(ScraperLookup(scraper.clone())), &config.creative);
    let resolver = CreativeResolver::new(Arc::new(HttpImageFetcher::new()?), config.creative.clone())
        .with_fallback(Arc::new(fallback));

    let ads = AdSearchRunner::new(scraper, resolver).run(query).await?;
    println!("{}", serde_json::to_string_pretty(&ads)?);
    Ok(())
}

fn candidates(file: &PathBuf) -> Result<()> {
    let raw = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let parsed: Value = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not valid JSON", file.display()))?;

    let items = match parsed {
        Value::Array(items) => items,
        item => vec![item],
    };

    let report: Vec<Value> = items
        .iter()
        .map(|item| {
            let ad_id = ad_id_of(item).unwrap_or_default();
            let ranked = CreativeResolver::candidates(item, &ad_id);
            serde_json::json!({ "ad_archive_id": ad_id, "candidates": ranked })
        })
        .collect();

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
