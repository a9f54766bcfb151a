use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Label name to label value, as found on a single sample line.
pub type Labels = BTreeMap<String, String>;

/// Decoded families keyed by family name.
pub type MetricFamiliesByName = BTreeMap<String, MetricFamily>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MetricType {
    Counter,
    Gauge,
    Histogram,
    Summary,
    #[default]
    Untyped,
}

impl MetricType {
    pub fn as_str(self) -> &'static str {
        match self {
            MetricType::Counter => "counter",
            MetricType::Gauge => "gauge",
            MetricType::Histogram => "histogram",
            MetricType::Summary => "summary",
            MetricType::Untyped => "untyped",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "counter" => Ok(MetricType::Counter),
            "gauge" => Ok(MetricType::Gauge),
            "histogram" => Ok(MetricType::Histogram),
            "summary" => Ok(MetricType::Summary),
            "untyped" => Ok(MetricType::Untyped),
            other => Err(format!("unknown metric type {other:?}")),
        }
    }
}

/// A named group of samples sharing help text and type.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: String,
    pub help: String,
    pub metric_type: MetricType,
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    /// Finds the first sample carrying exactly the given labels.
    pub fn sample(&self, labels: &[(&str, &str)]) -> Option<&Sample> {
        self.samples.iter().find(|sample| {
            sample.labels.len() == labels.len()
                && labels
                    .iter()
                    .all(|(name, value)| sample.labels.get(*name).map(String::as_str) == Some(*value))
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub labels: Labels,
    pub value: SampleValue,
    /// Milliseconds since the Unix epoch, when the exporter supplied one.
    pub timestamp_ms: Option<i64>,
}

impl Sample {
    /// The plain value of a counter, gauge or untyped sample.
    pub fn single_value(&self) -> Option<f64> {
        match self.value {
            SampleValue::Single(value) => Some(value),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SampleValue {
    Single(f64),
    Histogram(HistogramValueSample),
    Summary(SummaryValueSample),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct HistogramValueSample {
    pub count: u64,
    pub sum: f64,
    pub buckets: Vec<BucketValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BucketValue {
    pub upper_bound: f64,
    pub cumulative_count: u64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct SummaryValueSample {
    pub count: u64,
    pub sum: f64,
    pub quantiles: Vec<QuantileValue>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QuantileValue {
    pub quantile: f64,
    pub value: f64,
}
