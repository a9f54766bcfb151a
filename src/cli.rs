use std::path::PathBuf;

use clap::Parser;
use clap::ValueHint;
use once_cell::sync::Lazy;
use promscrape::prom::{DEFAULT_ACCEPT_HEADER, DEFAULT_SCRAPE_TIMEOUT_SECONDS};
use regex::Regex;

static PORT_IN_URL: Lazy<Regex> = Lazy::new(|| Regex::new(":(\\d{2,5})/").expect("port regex"));

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Prometheus endpoint to scrape
    ///
    /// The Prometheus endpoint used to scrape metrics from.
    #[arg(short, long, env="PROM_ENDPOINT", value_hint=ValueHint::Url, default_value="http://localhost:8080/metrics")]
    pub endpoint: String,

    /// Prometheus endpoint's port number
    ///
    /// The port number used in the default prometheus endpoint. Example: http://localhost:<PORT>/metrics
    #[arg(short, long, env="PROM_PORT", value_hint=ValueHint::Other)]
    pub port: Option<u16>,

    /// Accept header sent to the endpoint
    #[arg(short, long, env="PROM_ACCEPT", value_hint=ValueHint::Other, default_value=DEFAULT_ACCEPT_HEADER)]
    pub accept: String,

    /// Scrape timeout in seconds
    ///
    /// Advertised to the exporter and used as the HTTP client timeout.
    #[arg(short='t', long, env="PROM_SCRAPE_TIMEOUT", value_hint=ValueHint::Other, default_value_t=DEFAULT_SCRAPE_TIMEOUT_SECONDS)]
    pub scrape_timeout: u16,

    /// Scrape interval of the prometheus endpoint
    ///
    /// When set, the endpoint is scraped again after every interval until the process is stopped.
    #[arg(short='i', long, env="PROM_SCRAPE_INTERVAL", value_hint=ValueHint::Other)]
    pub scrape_interval: Option<u16>,

    /// Print the scraper's own metrics after every scrape
    #[arg(short, long)]
    pub self_metrics: bool,

    /// Set the logging level
    #[arg(short, long, env="LOG_LEVEL", value_hint=ValueHint::Other, default_value="INFO")]
    pub loglevel: log::LevelFilter,

    /// Also write the log to this file
    #[arg(long, env="LOG_FILE", value_hint=ValueHint::FilePath)]
    pub log_file: Option<PathBuf>,
}

impl Cli {
    /// The endpoint with its port replaced by `--port`, when given.
    pub fn resolved_endpoint(&self) -> String {
        match self.port {
            Some(port) => PORT_IN_URL
                .replace(&self.endpoint, format!(":{port}/", port = port))
                .to_string(),
            None => self.endpoint.clone(),
        }
    }
}
