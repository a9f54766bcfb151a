mod model;
pub use self::model::BucketValue;
pub use self::model::HistogramValueSample;
pub use self::model::Labels;
pub use self::model::MetricFamiliesByName;
pub use self::model::MetricFamily;
pub use self::model::MetricType;
pub use self::model::QuantileValue;
pub use self::model::Sample;
pub use self::model::SampleValue;
pub use self::model::SummaryValueSample;

mod parser;
pub use self::parser::decode;
pub use self::parser::DecodeError;
pub use self::parser::FamilyDecoder;

mod metric_scraper;
pub use self::metric_scraper::get;
pub use self::metric_scraper::BoxError;
pub use self::metric_scraper::HttpDoer;
pub use self::metric_scraper::MetricScraper;
pub use self::metric_scraper::ResponseBody;
pub use self::metric_scraper::ScrapeError;
pub use self::metric_scraper::ACCEPT_HEADER;
pub use self::metric_scraper::DEFAULT_ACCEPT_HEADER;
pub use self::metric_scraper::DEFAULT_SCRAPE_TIMEOUT_SECONDS;
pub use self::metric_scraper::SCRAPE_TIMEOUT_HEADER;

mod scrape_metrics;
pub use self::scrape_metrics::ScrapeMetrics;
pub use self::scrape_metrics::TARGET_SIZE_METRIC;
pub use self::scrape_metrics::TOTAL_SCRAPED_PAYLOAD_METRIC;

#[cfg(test)]
mod test_data;
