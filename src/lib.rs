//! Scrape a Prometheus text exposition endpoint and decode it into metric
//! families keyed by name, while keeping track of how much was scraped.
//!
//! ```no_run
//! use promscrape::prom::{MetricScraper, ScrapeMetrics};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let scraper = MetricScraper::new(reqwest::blocking::Client::new(), ScrapeMetrics::new()?);
//! let families = scraper.scrape("http://localhost:9100/metrics")?;
//! for (name, family) in &families {
//!     println!("{name}: {} samples", family.samples.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod prom;
