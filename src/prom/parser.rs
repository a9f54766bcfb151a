//! Decoder for the Prometheus text exposition format.
//!
//! The decoder is lazy: every call to [`Iterator::next`] consumes just enough
//! lines to produce one complete metric family. A family ends where the next
//! `# HELP`/`# TYPE` descriptor for another name starts, or where a sample
//! appears whose name the current family does not own.
//!
//! Names of families already yielded are remembered. Bare samples of an
//! earlier counter, gauge or untyped family start a new family of the declared
//! type. Histogram and summary samples are parts of one value, so they must
//! stay together: parts showing up after their family ended are an error.

use std::collections::HashMap;
use std::iter::{Enumerate, Peekable};
use std::str::Lines;

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use super::model::{
    BucketValue, HistogramValueSample, Labels, MetricFamily, MetricType, QuantileValue, Sample,
    SampleValue, SummaryValueSample,
};

static METRIC_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[a-zA-Z_:][a-zA-Z0-9_:]*$").expect("metric name regex"));
static LABEL_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new("^[a-zA-Z_][a-zA-Z0-9_]*$").expect("label name regex"));
static DESCRIPTOR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#[ \t]*(HELP|TYPE)(?:[ \t]+(\S+)(?:[ \t]+(.*))?)?$").expect("descriptor regex")
});

const BUCKET_LABEL: &str = "le";
const QUANTILE_LABEL: &str = "quantile";
const RESERVED_LABEL: &str = "__name__";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("text format parsing error in line {line}: {message}")]
pub struct DecodeError {
    pub line: usize,
    pub message: String,
}

/// Starts decoding a raw payload. Fails if the payload is not UTF-8.
pub fn decode(body: &[u8]) -> Result<FamilyDecoder<'_>, DecodeError> {
    match std::str::from_utf8(body) {
        Ok(text) => Ok(FamilyDecoder::new(text)),
        Err(err) => {
            let valid = &body[..err.valid_up_to()];
            Err(DecodeError {
                line: valid.iter().filter(|&&b| b == b'\n').count() + 1,
                message: "payload is not valid UTF-8".to_string(),
            })
        }
    }
}

/// Yields one [`MetricFamily`] at a time. Stops after the first error.
pub struct FamilyDecoder<'a> {
    lines: Peekable<Enumerate<Lines<'a>>>,
    declared: HashMap<String, (MetricType, String)>,
    done: bool,
}

impl<'a> FamilyDecoder<'a> {
    pub fn new(text: &'a str) -> Self {
        FamilyDecoder {
            lines: text.lines().enumerate().peekable(),
            declared: HashMap::new(),
            done: false,
        }
    }

    fn read_family(&mut self) -> Result<Option<FamilyBuilder>, DecodeError> {
        let mut current: Option<FamilyBuilder> = None;
        while let Some(&(index, raw)) = self.lines.peek() {
            let at_line = |message: String| DecodeError {
                line: index + 1,
                message,
            };
            let line = parse_line(raw).map_err(at_line)?;
            if let Some(family) = &current {
                if !family.owns(&line) {
                    break;
                }
            }
            self.lines.next();

            match line {
                Line::Blank | Line::Comment => {}
                Line::Help { name, help } => current
                    .get_or_insert_with(|| FamilyBuilder::new(name))
                    .set_help(help)
                    .map_err(at_line)?,
                Line::Type { name, metric_type } => current
                    .get_or_insert_with(|| FamilyBuilder::new(name))
                    .set_type(metric_type)
                    .map_err(at_line)?,
                Line::Sample(sample) => {
                    if current.is_none() {
                        current = Some(self.start_family(sample.name).map_err(at_line)?);
                    }
                    if let Some(family) = current.as_mut() {
                        family.add_sample(sample).map_err(at_line)?;
                    }
                }
            }
        }
        Ok(current)
    }

    /// Opens a family for a sample that no header introduced.
    fn start_family(&self, sample_name: &str) -> Result<FamilyBuilder, String> {
        if let Some(&(metric_type, ref help)) = self.declared.get(sample_name) {
            if is_compound(metric_type) {
                return Err(ended_family(sample_name, sample_name, metric_type));
            }
            return Ok(FamilyBuilder::restated(sample_name, metric_type, help));
        }
        for suffix in ["_bucket", "_sum", "_count"] {
            let Some(base) = sample_name.strip_suffix(suffix) else {
                continue;
            };
            match self.declared.get(base) {
                Some(&(MetricType::Histogram, _)) => {
                    return Err(ended_family(sample_name, base, MetricType::Histogram))
                }
                Some(&(MetricType::Summary, _)) if suffix != "_bucket" => {
                    return Err(ended_family(sample_name, base, MetricType::Summary))
                }
                _ => {}
            }
        }
        Ok(FamilyBuilder::new(sample_name))
    }
}

fn is_compound(metric_type: MetricType) -> bool {
    matches!(metric_type, MetricType::Histogram | MetricType::Summary)
}

fn ended_family(sample_name: &str, family: &str, metric_type: MetricType) -> String {
    format!("sample {sample_name:?} belongs to {metric_type} {family:?}, whose samples ended earlier")
}

impl Iterator for FamilyDecoder<'_> {
    type Item = Result<MetricFamily, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done {
            match self.read_family() {
                // descriptors without samples do not make a family
                Ok(Some(family)) if family.samples.is_empty() => continue,
                Ok(Some(family)) => {
                    let family = family.finish();
                    self.declared.insert(
                        family.name.clone(),
                        (family.metric_type, family.help.clone()),
                    );
                    return Some(Ok(family));
                }
                Ok(None) => self.done = true,
                Err(err) => {
                    self.done = true;
                    return Some(Err(err));
                }
            }
        }
        None
    }
}

enum Line<'a> {
    Blank,
    Comment,
    Help { name: &'a str, help: String },
    Type { name: &'a str, metric_type: MetricType },
    Sample(SampleLine<'a>),
}

struct SampleLine<'a> {
    name: &'a str,
    labels: Labels,
    value: f64,
    timestamp_ms: Option<i64>,
}

struct FamilyBuilder {
    name: String,
    help: Option<String>,
    inherited_help: String,
    metric_type: Option<MetricType>,
    samples: Vec<Sample>,
    grouped: HashMap<Labels, usize>,
}

impl FamilyBuilder {
    fn new(name: &str) -> Self {
        FamilyBuilder {
            name: name.to_string(),
            help: None,
            inherited_help: String::new(),
            metric_type: None,
            samples: Vec::new(),
            grouped: HashMap::new(),
        }
    }

    /// A family whose samples reappear without a header keeps its type and help.
    fn restated(name: &str, metric_type: MetricType, help: &str) -> Self {
        FamilyBuilder {
            metric_type: Some(metric_type),
            inherited_help: help.to_string(),
            ..FamilyBuilder::new(name)
        }
    }

    fn owns(&self, line: &Line<'_>) -> bool {
        match line {
            Line::Blank | Line::Comment => true,
            Line::Help { name, .. } | Line::Type { name, .. } => *name == self.name,
            Line::Sample(sample) => self.suffix_of(sample.name).is_some(),
        }
    }

    /// The part of a sample name that follows the family name, if the family
    /// owns samples of that name.
    fn suffix_of<'n>(&self, sample_name: &'n str) -> Option<&'n str> {
        let suffix = sample_name.strip_prefix(self.name.as_str())?;
        let allowed: &[&str] = match self.metric_type {
            Some(MetricType::Histogram) => &["", "_bucket", "_sum", "_count"],
            Some(MetricType::Summary) => &["", "_sum", "_count"],
            _ => &[""],
        };
        allowed.contains(&suffix).then_some(suffix)
    }

    fn set_help(&mut self, help: String) -> Result<(), String> {
        if self.help.is_some() {
            return Err(format!("second HELP line for metric name {:?}", self.name));
        }
        self.help = Some(help);
        Ok(())
    }

    fn set_type(&mut self, metric_type: MetricType) -> Result<(), String> {
        if self.metric_type.is_some() || !self.samples.is_empty() {
            return Err(format!(
                "second TYPE line for metric name {:?}, or TYPE reported after samples",
                self.name
            ));
        }
        self.metric_type = Some(metric_type);
        Ok(())
    }

    fn add_sample(&mut self, line: SampleLine<'_>) -> Result<(), String> {
        let suffix = self.suffix_of(line.name).unwrap_or_default();
        let SampleLine {
            name,
            mut labels,
            value,
            timestamp_ms,
        } = line;

        match self.metric_type.unwrap_or_default() {
            MetricType::Counter | MetricType::Gauge | MetricType::Untyped => {
                self.samples.push(Sample {
                    labels,
                    value: SampleValue::Single(value),
                    timestamp_ms,
                });
            }
            MetricType::Histogram => {
                let bound = match suffix {
                    "_bucket" => Some(take_float_label(&mut labels, BUCKET_LABEL, name)?),
                    "_sum" | "_count" => None,
                    _ => {
                        return Err(format!(
                            "histogram sample {name:?} needs a _bucket, _sum or _count suffix"
                        ))
                    }
                };
                let sample = self.grouped_sample(labels, timestamp_ms, || {
                    SampleValue::Histogram(HistogramValueSample::default())
                });
                if let SampleValue::Histogram(histogram) = &mut sample.value {
                    match (suffix, bound) {
                        ("_sum", _) => histogram.sum = value,
                        ("_count", _) => histogram.count = as_count(value),
                        (_, Some(upper_bound)) => histogram.buckets.push(BucketValue {
                            upper_bound,
                            cumulative_count: as_count(value),
                        }),
                        _ => {}
                    }
                }
            }
            MetricType::Summary => {
                let quantile = match suffix {
                    "" => Some(take_float_label(&mut labels, QUANTILE_LABEL, name)?),
                    _ => None,
                };
                let sample = self.grouped_sample(labels, timestamp_ms, || {
                    SampleValue::Summary(SummaryValueSample::default())
                });
                if let SampleValue::Summary(summary) = &mut sample.value {
                    match (suffix, quantile) {
                        ("_sum", _) => summary.sum = value,
                        ("_count", _) => summary.count = as_count(value),
                        (_, Some(quantile)) => {
                            summary.quantiles.push(QuantileValue { quantile, value })
                        }
                        _ => {}
                    }
                }
            }
        }
        Ok(())
    }

    /// Histogram and summary lines sharing a label set fold into one sample.
    fn grouped_sample(
        &mut self,
        labels: Labels,
        timestamp_ms: Option<i64>,
        empty: impl FnOnce() -> SampleValue,
    ) -> &mut Sample {
        let index = match self.grouped.get(&labels) {
            Some(&index) => index,
            None => {
                let index = self.samples.len();
                self.grouped.insert(labels.clone(), index);
                self.samples.push(Sample {
                    labels,
                    value: empty(),
                    timestamp_ms: None,
                });
                index
            }
        };
        let sample = &mut self.samples[index];
        if timestamp_ms.is_some() {
            sample.timestamp_ms = timestamp_ms;
        }
        sample
    }

    fn finish(self) -> MetricFamily {
        MetricFamily {
            name: self.name,
            help: self.help.unwrap_or(self.inherited_help),
            metric_type: self.metric_type.unwrap_or_default(),
            samples: self.samples,
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn as_count(value: f64) -> u64 {
    value as u64
}

fn take_float_label(labels: &mut Labels, label: &str, sample_name: &str) -> Result<f64, String> {
    let raw = labels
        .remove(label)
        .ok_or_else(|| format!("sample {sample_name:?} is missing the {label:?} label"))?;
    parse_float(&raw).ok_or_else(|| format!("expected float as value for {label:?} label, got {raw:?}"))
}

fn parse_float(token: &str) -> Option<f64> {
    token.parse::<f64>().ok().or_else(|| parse_hex_float(token))
}

/// Hexadecimal floats as exporters written in Go may emit them:
/// `[+-]0x<hex digits>[.<hex digits>]p[+-]<exponent>`.
fn parse_hex_float(token: &str) -> Option<f64> {
    let (negative, rest) = match token.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, token.strip_prefix('+').unwrap_or(token)),
    };
    let rest = rest.strip_prefix("0x").or_else(|| rest.strip_prefix("0X"))?;
    let (mantissa, exponent) = rest.split_once(['p', 'P'])?;
    let exponent: i32 = exponent.parse().ok()?;
    let (whole, fraction) = mantissa.split_once('.').unwrap_or((mantissa, ""));
    if whole.is_empty() && fraction.is_empty() {
        return None;
    }

    let mut value = 0.0_f64;
    for c in whole.chars().chain(fraction.chars()) {
        value = value * 16.0 + f64::from(c.to_digit(16)?);
    }
    let scale = exponent.checked_sub(4 * i32::try_from(fraction.len()).ok()?)?;
    let value = value * 2f64.powi(scale);
    Some(if negative { -value } else { value })
}

fn parse_line(raw: &str) -> Result<Line<'_>, String> {
    let line = raw.trim();
    if line.is_empty() {
        return Ok(Line::Blank);
    }
    if !line.starts_with('#') {
        return parse_sample(line).map(Line::Sample);
    }

    let Some(captures) = DESCRIPTOR.captures(line) else {
        return Ok(Line::Comment);
    };
    let Some(name) = captures.get(2).map(|m| m.as_str()) else {
        return Ok(Line::Comment);
    };
    if !METRIC_NAME.is_match(name) {
        return Err(format!("invalid metric name {name:?} in comment"));
    }
    let text = captures.get(3).map_or("", |m| m.as_str());

    if &captures[1] == "HELP" {
        return Ok(Line::Help {
            name,
            help: unescape_help(text)?,
        });
    }
    if text.is_empty() {
        return Err(format!("missing metric type for {name:?}"));
    }
    Ok(Line::Type {
        name,
        metric_type: text.parse()?,
    })
}

fn unescape_help(text: &str) -> Result<String, String> {
    let mut help = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            help.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => help.push('\\'),
            Some('n') => help.push('\n'),
            Some(other) => return Err(format!("invalid escape sequence '\\{other}' in HELP")),
            None => return Err("unterminated escape sequence in HELP".to_string()),
        }
    }
    Ok(help)
}

fn parse_sample(line: &str) -> Result<SampleLine<'_>, String> {
    let mut cursor = Cursor { rest: line };

    let name = cursor.take_while(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':');
    if !METRIC_NAME.is_match(name) {
        return Err(format!("invalid metric name in line {line:?}"));
    }
    cursor.skip_blank();

    let mut labels = Labels::new();
    if cursor.eat('{') {
        loop {
            cursor.skip_blank();
            if cursor.eat('}') {
                break;
            }
            let label = cursor.take_while(|c| c.is_ascii_alphanumeric() || c == '_');
            if !LABEL_NAME.is_match(label) {
                return Err(format!("invalid label name for metric {name:?}"));
            }
            if label == RESERVED_LABEL {
                return Err(format!("label name {RESERVED_LABEL:?} is reserved"));
            }
            cursor.skip_blank();
            if !cursor.eat('=') {
                return Err(format!("expected '=' after label name {label:?}"));
            }
            cursor.skip_blank();
            if !cursor.eat('"') {
                return Err(format!("expected '\"' to open the value of label {label:?}"));
            }
            let value = cursor.label_value()?;
            if labels.insert(label.to_string(), value).is_some() {
                return Err(format!("duplicate label name {label:?} for metric {name:?}"));
            }
            cursor.skip_blank();
            if cursor.eat(',') {
                continue;
            }
            if cursor.eat('}') {
                break;
            }
            return Err(format!("unexpected character after value of label {label:?}"));
        }
        cursor.skip_blank();
    }

    let token = cursor.take_while(|c| !is_blank(c));
    if token.is_empty() {
        return Err(format!("missing value for metric {name:?}"));
    }
    let value =
        parse_float(token).ok_or_else(|| format!("expected float as value, got {token:?}"))?;
    cursor.skip_blank();

    let mut timestamp_ms = None;
    if !cursor.rest.is_empty() {
        let token = cursor.take_while(|c| !is_blank(c));
        let timestamp = token
            .parse::<i64>()
            .map_err(|_| format!("expected integer as timestamp, got {token:?}"))?;
        cursor.skip_blank();
        if !cursor.rest.is_empty() {
            return Err(format!("spurious string after timestamp: {:?}", cursor.rest));
        }
        timestamp_ms = Some(timestamp);
    }

    Ok(SampleLine {
        name,
        labels,
        value,
        timestamp_ms,
    })
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

struct Cursor<'a> {
    rest: &'a str,
}

impl<'a> Cursor<'a> {
    fn skip_blank(&mut self) {
        self.rest = self.rest.trim_start_matches(is_blank);
    }

    fn eat(&mut self, c: char) -> bool {
        match self.rest.strip_prefix(c) {
            Some(rest) => {
                self.rest = rest;
                true
            }
            None => false,
        }
    }

    fn take_while(&mut self, accept: impl Fn(char) -> bool) -> &'a str {
        let rest: &'a str = self.rest;
        let end = rest.find(|c: char| !accept(c)).unwrap_or(rest.len());
        let (token, rest) = rest.split_at(end);
        self.rest = rest;
        token
    }

    /// Reads a quoted label value; the opening quote is already consumed.
    fn label_value(&mut self) -> Result<String, String> {
        let rest: &'a str = self.rest;
        let mut value = String::new();
        let mut chars = rest.char_indices();
        while let Some((index, c)) = chars.next() {
            match c {
                '"' => {
                    self.rest = &rest[index + 1..];
                    return Ok(value);
                }
                '\\' => match chars.next() {
                    Some((_, '\\')) => value.push('\\'),
                    Some((_, '"')) => value.push('"'),
                    Some((_, 'n')) => value.push('\n'),
                    Some((_, other)) => {
                        return Err(format!("invalid escape sequence '\\{other}' in label value"))
                    }
                    None => break,
                },
                other => value.push(other),
            }
        }
        Err("unexpected end of label value".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prom::test_data;

    fn decode_all(text: &str) -> Result<Vec<MetricFamily>, DecodeError> {
        FamilyDecoder::new(text).collect()
    }

    fn decode_err(text: &str) -> DecodeError {
        decode_all(text).expect_err("payload should be rejected")
    }

    #[test]
    fn empty_payload_yields_nothing() {
        assert!(decode_all("").unwrap().is_empty());
        assert!(decode_all("\n\n  \n# just a comment\n").unwrap().is_empty());
    }

    #[test]
    fn decodes_counter_and_gauge_families() {
        let families = decode_all(test_data::THREE_FAMILIES).unwrap();
        let names: Vec<&str> = families.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(
            names,
            ["http_requests_total", "process_open_fds", "build_info"]
        );

        let requests = &families[0];
        assert_eq!(requests.metric_type, MetricType::Counter);
        assert_eq!(requests.help, "The total number of HTTP requests.");
        assert_eq!(requests.samples.len(), 2);
        let ok = requests
            .sample(&[("method", "post"), ("code", "200")])
            .unwrap();
        assert_eq!(ok.single_value(), Some(1027.0));
        assert_eq!(ok.timestamp_ms, Some(1395066363000));

        let fds = &families[1];
        assert_eq!(fds.metric_type, MetricType::Gauge);
        assert_eq!(fds.samples[0].single_value(), Some(42.0));
        assert!(fds.samples[0].labels.is_empty());

        let build = &families[2];
        assert_eq!(build.metric_type, MetricType::Untyped);
        assert_eq!(build.help, "");
        assert_eq!(build.samples[0].labels["version"], "1.2.3");
    }

    #[test]
    fn decodes_histogram_grouped_by_labels() {
        let families = decode_all(test_data::HISTOGRAM).unwrap();
        assert_eq!(families.len(), 1);
        let family = &families[0];
        assert_eq!(family.name, "http_request_duration_seconds");
        assert_eq!(family.metric_type, MetricType::Histogram);
        assert_eq!(family.samples.len(), 2);

        let get = family.sample(&[("handler", "/")]).unwrap();
        let SampleValue::Histogram(histogram) = &get.value else {
            panic!("expected histogram, got {:?}", get.value);
        };
        assert_eq!(histogram.count, 144320);
        assert_eq!(histogram.sum, 53423.0);
        let bounds: Vec<f64> = histogram.buckets.iter().map(|b| b.upper_bound).collect();
        assert_eq!(bounds, [0.05, 0.1, 0.5, f64::INFINITY]);
        assert_eq!(histogram.buckets[3].cumulative_count, 144320);
        assert!(!get.labels.contains_key("le"));
    }

    #[test]
    fn decodes_summary_quantiles() {
        let families = decode_all(test_data::SUMMARY).unwrap();
        let family = &families[0];
        assert_eq!(family.metric_type, MetricType::Summary);
        let SampleValue::Summary(summary) = &family.samples[0].value else {
            panic!("expected summary");
        };
        assert_eq!(summary.count, 2693);
        assert_eq!(summary.sum, 1.7560473e+07);
        assert_eq!(summary.quantiles.len(), 3);
        assert_eq!(summary.quantiles[2].quantile, 0.99);
        assert_eq!(summary.quantiles[2].value, 76656.0);
        assert!(family.samples[0].labels.is_empty());
    }

    #[test]
    fn special_float_values() {
        let families = decode_all("a NaN\nb +Inf\nc -Inf\nd 1.5e3\n").unwrap();
        assert!(families[0].samples[0].single_value().unwrap().is_nan());
        assert_eq!(families[1].samples[0].single_value(), Some(f64::INFINITY));
        assert_eq!(families[2].samples[0].single_value(), Some(f64::NEG_INFINITY));
        assert_eq!(families[3].samples[0].single_value(), Some(1500.0));
    }

    #[test]
    fn label_value_escapes_and_whitespace() {
        let text = "msg{ text = \"a \\\"quoted\\\" \\\\ line\\nbreak\" , other=\"x\", } 1\n";
        let families = decode_all(text).unwrap();
        let labels = &families[0].samples[0].labels;
        assert_eq!(labels["text"], "a \"quoted\" \\ line\nbreak");
        assert_eq!(labels["other"], "x");
    }

    #[test]
    fn help_escapes() {
        let families = decode_all("# HELP a first\\nsecond \\\\ done\na 1\n").unwrap();
        assert_eq!(families[0].help, "first\nsecond \\ done");
        assert_eq!(decode_err("# HELP a bad \\t escape\na 1\n").line, 1);
    }

    #[test]
    fn descriptor_only_families_are_dropped() {
        let text = "# HELP a nothing here\n# TYPE a gauge\n# HELP b something\nb 2\n";
        let families = decode_all(text).unwrap();
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].name, "b");
        assert_eq!(families[0].help, "something");
    }

    #[test]
    fn repeated_name_starts_a_new_family() {
        let families = decode_all(test_data::DUPLICATE_FAMILY).unwrap();
        let names: Vec<&str> = families.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["jobs_queued", "workers", "jobs_queued"]);
        assert_eq!(families[2].samples[0].single_value(), Some(7.0));
    }

    #[test]
    fn suffixed_names_outside_histograms_are_own_families() {
        let families = decode_all("# TYPE foo counter\nfoo 1\nfoo_count 2\n").unwrap();
        assert_eq!(families.len(), 2);
        assert_eq!(families[1].name, "foo_count");
        assert_eq!(families[1].metric_type, MetricType::Untyped);
    }

    #[test]
    fn comments_inside_a_family_are_ignored() {
        let text = "# TYPE a gauge\na{x=\"1\"} 1\n# some note\na{x=\"2\"} 2\n";
        let families = decode_all(text).unwrap();
        assert_eq!(families.len(), 1);
        assert_eq!(families[0].samples.len(), 2);
    }

    #[test]
    fn malformed_lines_report_their_line_number() {
        let cases = [
            ("a 1\nb{x=\"1\" 2\n", 2),
            ("a one\n", 1),
            ("a 1 notatime\n", 1),
            ("a 1 1000 extra\n", 1),
            ("a{x=\"1\",x=\"2\"} 1\n", 1),
            ("a{__name__=\"b\"} 1\n", 1),
            ("a{x=\"unterminated} 1\n", 1),
            ("a{x=\"bad\\q\"} 1\n", 1),
            ("a\n", 1),
            ("{x=\"1\"} 1\n", 1),
            ("# TYPE a gauge\n# TYPE a counter\n", 2),
            ("# HELP a one\n# HELP a two\n", 2),
            ("a 1\n# TYPE a gauge\n", 2),
            ("# TYPE a flux\n", 1),
            ("# TYPE a\n", 1),
            ("# HELP 9a text\n", 1),
            ("# TYPE h histogram\nh_bucket 1\n", 2),
            ("# TYPE h histogram\nh_bucket{le=\"x\"} 1\n", 2),
            ("# TYPE h histogram\nh 1\n", 2),
            ("# TYPE s summary\ns 1\n", 2),
        ];
        for (text, line) in cases {
            let err = decode_err(text);
            assert_eq!(err.line, line, "{text:?} -> {err}");
        }
    }

    #[test]
    fn restated_family_keeps_declared_type_and_help() {
        let text = "# HELP a Queue depth.\n# TYPE a gauge\na 1\nb 2\na 3\n";
        let families = decode_all(text).unwrap();
        let names: Vec<&str> = families.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a", "b", "a"]);
        let restated = &families[2];
        assert_eq!(restated.metric_type, MetricType::Gauge);
        assert_eq!(restated.help, "Queue depth.");
        assert_eq!(restated.samples[0].single_value(), Some(3.0));
    }

    #[test]
    fn summary_parts_after_another_family_are_rejected() {
        let text = "# TYPE s summary\ns{quantile=\"0.5\"} 1\nother 2\ns_sum 3\ns_count 4\n";
        let mut decoder = FamilyDecoder::new(text);
        assert_eq!(decoder.next().unwrap().unwrap().name, "s");
        assert_eq!(decoder.next().unwrap().unwrap().name, "other");
        let err = decoder.next().unwrap().unwrap_err();
        assert_eq!(err.line, 4);
        assert!(err.message.contains("summary \"s\""), "{err}");
        assert!(decoder.next().is_none());
    }

    #[test]
    fn histogram_parts_after_another_family_are_rejected() {
        let text = "# TYPE h histogram\nh_bucket{le=\"+Inf\"} 1\nh_count 1\nother 2\nh_bucket{le=\"+Inf\"} 5\n";
        let err = decode_err(text);
        assert_eq!(err.line, 5);
        assert!(err.message.contains("histogram \"h\""), "{err}");

        assert_eq!(decode_err("# TYPE h histogram\nh_sum 1\nother 2\nh 3\n").line, 4);
    }

    #[test]
    fn header_reopens_a_compound_family() {
        let text = "# TYPE s summary\ns_sum 1\nother 2\n# TYPE s summary\ns_sum 3\ns_count 4\n";
        let families = decode_all(text).unwrap();
        assert_eq!(families.len(), 3);
        let SampleValue::Summary(summary) = &families[2].samples[0].value else {
            panic!("expected summary");
        };
        assert_eq!((summary.count, summary.sum), (4, 3.0));
    }

    #[test]
    fn undeclared_suffixed_names_stay_plain_families() {
        let families = decode_all("# TYPE c counter\nc 1\nother 2\nc_count 3\n").unwrap();
        assert_eq!(families[2].name, "c_count");
        assert_eq!(families[2].metric_type, MetricType::Untyped);
    }

    #[test]
    fn hexadecimal_floats() {
        let families = decode_all("a 0x1p3\nb -0x1.8p1\nc 0X1P-2\n# TYPE h histogram\nh_bucket{le=\"0x1p1\"} 4\n").unwrap();
        assert_eq!(families[0].samples[0].single_value(), Some(8.0));
        assert_eq!(families[1].samples[0].single_value(), Some(-3.0));
        assert_eq!(families[2].samples[0].single_value(), Some(0.25));
        let SampleValue::Histogram(histogram) = &families[3].samples[0].value else {
            panic!("expected histogram");
        };
        assert_eq!(histogram.buckets[0].upper_bound, 2.0);

        for bad in ["0x1", "0xp3", "0x1g1p0", "0x1p"] {
            assert!(decode_all(&format!("a {bad}\n")).is_err(), "{bad}");
        }
    }

    #[test]
    fn decoder_stops_after_first_error() {
        let mut decoder = FamilyDecoder::new(test_data::BROKEN_THIRD_FAMILY);
        assert!(decoder.next().unwrap().is_ok());
        assert!(decoder.next().unwrap().is_ok());
        let err = decoder.next().unwrap().unwrap_err();
        assert_eq!(err.line, 7);
        assert!(decoder.next().is_none());
    }

    #[test]
    fn non_utf8_payload_is_rejected() {
        let err = decode(b"a 1\nb\xff 2\n").err().unwrap();
        assert_eq!(err.line, 2);
    }

    #[test]
    fn plain_comments_mentioning_descriptors() {
        let families = decode_all("# HELP\n# HELPER a b\n#TYPE a gauge\na 1\n").unwrap();
        assert_eq!(families[0].metric_type, MetricType::Gauge);
    }
}
