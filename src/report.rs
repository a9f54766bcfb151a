use std::io::{self, Write};

use chrono::{DateTime, SecondsFormat, Utc};
use promscrape::prom::{Labels, MetricFamiliesByName, MetricFamily, Sample, SampleValue};

pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        (if value > 0.0 { "+Inf" } else { "-Inf" }).to_string()
    } else if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{value:.0}")
    } else {
        format!("{value}")
    }
}

fn format_labels(labels: &Labels) -> String {
    if labels.is_empty() {
        return String::new();
    }
    let pairs: Vec<String> = labels
        .iter()
        .map(|(name, value)| format!("{name}={value:?}"))
        .collect();
    format!("{{{}}}", pairs.join(","))
}

fn format_timestamp(timestamp_ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(timestamp_ms)
        .map(|time| time.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| format!("{timestamp_ms}ms"))
}

/// Writes every family, sorted by name, followed by its samples.
pub fn write_families(out: &mut impl Write, families: &MetricFamiliesByName) -> io::Result<()> {
    for family in families.values() {
        write_family(out, family)?;
    }
    Ok(())
}

fn write_family(out: &mut impl Write, family: &MetricFamily) -> io::Result<()> {
    write!(out, "{} ({})", family.name, family.metric_type)?;
    if !family.help.is_empty() {
        write!(out, " - {}", family.help.replace('\n', " "))?;
    }
    writeln!(out)?;
    for sample in &family.samples {
        write_sample(out, sample)?;
    }
    Ok(())
}

fn write_sample(out: &mut impl Write, sample: &Sample) -> io::Result<()> {
    let labels = format_labels(&sample.labels);
    let time = sample
        .timestamp_ms
        .map(|ts| format!(" @ {}", format_timestamp(ts)))
        .unwrap_or_default();

    match &sample.value {
        SampleValue::Single(value) => {
            writeln!(out, "  {labels} {}{time}", format_value(*value))?;
        }
        SampleValue::Histogram(histogram) => {
            writeln!(
                out,
                "  {labels} count={} sum={}{time}",
                histogram.count,
                format_value(histogram.sum)
            )?;
            for bucket in &histogram.buckets {
                writeln!(
                    out,
                    "    le={} {}",
                    format_value(bucket.upper_bound),
                    bucket.cumulative_count
                )?;
            }
        }
        SampleValue::Summary(summary) => {
            writeln!(
                out,
                "  {labels} count={} sum={}{time}",
                summary.count,
                format_value(summary.sum)
            )?;
            for quantile in &summary.quantiles {
                writeln!(
                    out,
                    "    quantile={} {}",
                    format_value(quantile.quantile),
                    format_value(quantile.value)
                )?;
            }
        }
    }
    Ok(())
}
