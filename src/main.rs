use std::io::Write;
use std::thread;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use cli::Cli;
use prometheus::{Encoder, TextEncoder};
use promscrape::prom::{MetricScraper, ScrapeMetrics};

use crate::logging::app_config;

mod cli;
mod logging;
mod report;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // initialize the logger
    log4rs::init_config(app_config(cli.log_file.as_deref(), cli.loglevel)?)?;
    log::info!("Starting the application!");

    let endpoint = cli.resolved_endpoint();
    log::info!("Reading metrics from endpoint: {}", endpoint);

    let client = reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(cli.scrape_timeout.into()))
        .build()
        .context("failed to build the HTTP client")?;
    let scraper = MetricScraper::new(client, ScrapeMetrics::global()?.clone())
        .with_accept_header(cli.accept.as_str())
        .with_fetch_timeout(cli.scrape_timeout.to_string());

    let Some(interval) = cli.scrape_interval else {
        return scrape_once(&scraper, &endpoint, cli.self_metrics);
    };

    log::info!("Scraping interval is: {}s", interval);
    loop {
        if let Err(err) = scrape_once(&scraper, &endpoint, cli.self_metrics) {
            log::error!("{err:#}");
        }
        thread::sleep(Duration::from_secs(interval.into()));
    }
}

fn scrape_once(
    scraper: &MetricScraper<reqwest::blocking::Client>,
    endpoint: &str,
    self_metrics: bool,
) -> anyhow::Result<()> {
    let families = scraper
        .scrape(endpoint)
        .with_context(|| format!("scraping {endpoint} failed"))?;
    log::info!("Decoded {} metric families from {}", families.len(), endpoint);

    let mut out = std::io::stdout().lock();
    report::write_families(&mut out, &families)?;
    if self_metrics {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&prometheus::gather(), &mut buffer)?;
        out.write_all(&buffer)?;
    }
    out.flush()?;
    Ok(())
}
