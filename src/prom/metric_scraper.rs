use std::io::{self, Read};

use http::header::ACCEPT;
use reqwest::Url;
use thiserror::Error;

use super::model::MetricFamiliesByName;
use super::parser::{self, DecodeError};
use super::scrape_metrics::ScrapeMetrics;

/// Header telling the exporter how long we are willing to wait.
pub const SCRAPE_TIMEOUT_HEADER: &str = "X-Prometheus-Scrape-Timeout-Seconds";
/// Header used to negotiate the exposition format.
pub const ACCEPT_HEADER: &str = "Accept";
/// Accept value Prometheus itself sends when only the text format is wanted.
pub const DEFAULT_ACCEPT_HEADER: &str = "text/plain;version=0.0.4;q=1,*/*;q=0.1";
/// Scrape timeout advertised when the caller does not pick one.
pub const DEFAULT_SCRAPE_TIMEOUT_SECONDS: u16 = 10;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;
pub type ResponseBody = Box<dyn Read + Send>;

/// Anything able to execute a single HTTP request.
pub trait HttpDoer {
    fn send(&self, request: http::Request<()>) -> Result<http::Response<ResponseBody>, BoxError>;
}

impl HttpDoer for reqwest::blocking::Client {
    fn send(&self, request: http::Request<()>) -> Result<http::Response<ResponseBody>, BoxError> {
        let (parts, ()) = request.into_parts();
        let response = self
            .request(parts.method, parts.uri.to_string())
            .headers(parts.headers)
            .send()?;
        let status = response.status();
        let body: ResponseBody = Box::new(response);
        Ok(http::Response::builder().status(status).body(body)?)
    }
}

#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("could not build scrape request for {url:?}: {reason}")]
    RequestConstruction { url: String, reason: String },
    #[error("scrape request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: BoxError,
    },
    #[error("status code returned by the prometheus exporter indicates an error occurred: {status_code}")]
    HttpStatus { status_code: u16 },
    #[error("failed to read the scraped payload: {0}")]
    BodyRead(#[from] io::Error),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl ScrapeError {
    /// The result a caller gets alongside this error: an empty map when the
    /// failure happened before a response body could be read, nothing when
    /// the exporter answered with an error status or an undecodable payload.
    pub fn empty_result(&self) -> Option<MetricFamiliesByName> {
        match self {
            ScrapeError::RequestConstruction { .. }
            | ScrapeError::Transport { .. }
            | ScrapeError::BodyRead(_) => Some(MetricFamiliesByName::new()),
            ScrapeError::HttpStatus { .. } | ScrapeError::Decode(_) => None,
        }
    }
}

/// Scrapes `url` and decodes the payload into families keyed by name.
///
/// The scrape timeout is only advertised to the exporter; enforcing it is up
/// to the transport. The observability instruments are only touched when the
/// whole payload decoded successfully.
pub fn get<D: HttpDoer + ?Sized>(
    client: &D,
    metrics: &ScrapeMetrics,
    url: &str,
    accept_header: &str,
    fetch_timeout: &str,
) -> Result<MetricFamiliesByName, ScrapeError> {
    let request = build_request(url, accept_header, fetch_timeout)?;

    let response = client
        .send(request)
        .map_err(|source| ScrapeError::Transport {
            url: url.to_string(),
            source,
        })?;

    let status_code = response.status().as_u16();
    // inclusive upper bound: a 300 response is decoded like a 2xx one
    if status_code < 200 || status_code > 300 {
        return Err(ScrapeError::HttpStatus { status_code });
    }

    let mut body = Vec::new();
    response.into_body().read_to_end(&mut body)?;

    let mut families = MetricFamiliesByName::new();
    for family in parser::decode(&body)? {
        let family = family?;
        families.insert(family.name.clone(), family);
    }

    #[allow(clippy::cast_precision_loss)]
    let body_size = body.len() as f64;
    metrics.observe(url, body_size);
    log::debug!(
        "Scraped {} families ({} bytes) from {}",
        families.len(),
        body.len(),
        url
    );
    Ok(families)
}

fn build_request(
    url: &str,
    accept_header: &str,
    fetch_timeout: &str,
) -> Result<http::Request<()>, ScrapeError> {
    let invalid = |reason: String| ScrapeError::RequestConstruction {
        url: url.to_string(),
        reason,
    };

    let parsed = Url::parse(url).map_err(|err| invalid(err.to_string()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {:?}", parsed.scheme())));
    }

    http::Request::get(parsed.as_str())
        .header(ACCEPT, accept_header)
        .header(SCRAPE_TIMEOUT_HEADER, fetch_timeout)
        .body(())
        .map_err(|err| invalid(err.to_string()))
}

/// Scrapes targets with a fixed transport, metrics handle and headers.
pub struct MetricScraper<D> {
    client: D,
    metrics: ScrapeMetrics,
    accept_header: String,
    fetch_timeout: String,
}

impl<D: HttpDoer> MetricScraper<D> {
    pub fn new(client: D, metrics: ScrapeMetrics) -> Self {
        MetricScraper {
            client,
            metrics,
            accept_header: DEFAULT_ACCEPT_HEADER.to_string(),
            fetch_timeout: DEFAULT_SCRAPE_TIMEOUT_SECONDS.to_string(),
        }
    }

    pub fn with_accept_header(mut self, accept_header: impl Into<String>) -> Self {
        self.accept_header = accept_header.into();
        self
    }

    pub fn with_fetch_timeout(mut self, fetch_timeout: impl Into<String>) -> Self {
        self.fetch_timeout = fetch_timeout.into();
        self
    }

    pub fn metrics(&self) -> &ScrapeMetrics {
        &self.metrics
    }

    pub fn scrape(&self, url: &str) -> Result<MetricFamiliesByName, ScrapeError> {
        get(
            &self.client,
            &self.metrics,
            url,
            &self.accept_header,
            &self.fetch_timeout,
        )
    }
}
