//! Self-observability for scrapes: payload size per target and the total
//! number of bytes scraped since the process started.

use once_cell::sync::OnceCell;
use prometheus::core::Collector;
use prometheus::{Counter, GaugeVec, Opts, Registry};

pub const TARGET_SIZE_METRIC: &str = "promscrape_target_payload_size_bytes";
pub const TOTAL_SCRAPED_PAYLOAD_METRIC: &str = "promscrape_scraped_payload_bytes_total";
const TARGET_LABEL: &str = "target";

static GLOBAL: OnceCell<ScrapeMetrics> = OnceCell::new();

/// Handle to the scrape instruments. Clones share the same series.
#[derive(Clone)]
pub struct ScrapeMetrics {
    target_size: GaugeVec,
    total_scraped_payload: Counter,
}

impl ScrapeMetrics {
    /// Builds a fresh, unregistered set of instruments.
    pub fn new() -> prometheus::Result<Self> {
        let target_size = GaugeVec::new(
            Opts::new(
                TARGET_SIZE_METRIC,
                "Size in bytes of the last successful scrape of a target",
            ),
            &[TARGET_LABEL],
        )?;
        let total_scraped_payload = Counter::new(
            TOTAL_SCRAPED_PAYLOAD_METRIC,
            "Total size in bytes of all scraped payloads",
        )?;
        Ok(ScrapeMetrics {
            target_size,
            total_scraped_payload,
        })
    }

    /// The process-wide instance, registered in the default registry on first use.
    pub fn global() -> prometheus::Result<&'static ScrapeMetrics> {
        GLOBAL.get_or_try_init(|| {
            let metrics = ScrapeMetrics::new()?;
            metrics.register(prometheus::default_registry())?;
            Ok(metrics)
        })
    }

    pub fn register(&self, registry: &Registry) -> prometheus::Result<()> {
        registry.register(Box::new(self.target_size.clone()))?;
        registry.register(Box::new(self.total_scraped_payload.clone()))?;
        Ok(())
    }

    /// Records a successful scrape of `target` that returned `bytes` bytes.
    pub fn observe(&self, target: &str, bytes: f64) {
        self.target_size.with_label_values(&[target]).set(bytes);
        self.total_scraped_payload.inc_by(bytes);
    }

    pub fn target_size(&self, target: &str) -> Option<f64> {
        self.target_size
            .collect()
            .iter()
            .flat_map(|family| family.get_metric())
            .find(|metric| {
                metric
                    .get_label()
                    .iter()
                    .any(|pair| pair.get_name() == TARGET_LABEL && pair.get_value() == target)
            })
            .map(|metric| metric.get_gauge().get_value())
    }

    pub fn total_scraped_payload(&self) -> f64 {
        self.total_scraped_payload.get()
    }

    /// Drops every per-target series.
    pub fn reset_target_size(&self) {
        self.target_size.reset();
    }

    /// Sets the total back to zero. Breaks counter monotonicity, meant for tests.
    pub fn reset_total_scraped_payload(&self) {
        self.total_scraped_payload.reset();
    }
}
