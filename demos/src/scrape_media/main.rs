use std::{path::PathBuf, sync::Arc};

use clap::Parser;
use mediascraper::{normalize::normalize, ChromiumBrowser, Scraper, ScraperConfig};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Scrape title, description and thumbnail of share links.
#[derive(Debug, Parser)]
#[command(name = "scrape-media")]
struct Args {
    /// Share URLs to scrape
    #[arg(required = true)]
    urls: Vec<String>,
    /// TOML file with scraper settings
    #[arg(long)]
    config: Option<PathBuf>,
    /// Only print the normalized URLs, without starting a browser
    #[arg(long)]
    normalize_only: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::try_from_default_env()
                .or_else(|_| EnvFilter::try_new("info"))
                .expect("telemetry: Creating EnvFilter"),
        )
        .init();

    let args = Args::parse();

    if args.normalize_only {
        for url in &args.urls {
            println!("{}", normalize(url));
        }
        return Ok(());
    }

    let config = match &args.config {
        Some(path) => ScraperConfig::load(path)?,
        None => ScraperConfig::default(),
    };
    tracing::debug!(?config, "loaded configuration");

    let browser = Arc::new(ChromiumBrowser::new(config.chromium()));
    let scraper = Scraper::new(browser, config.options());
    let results = scraper.scrape(&args.urls).await?;

    println!("{}", serde_json::to_string_pretty(&results)?);
    Ok(())
}
