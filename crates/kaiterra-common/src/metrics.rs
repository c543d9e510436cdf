//! Prometheus metrics for Kaiterra readings.
//!
//! Maps a [`Reading`] onto a fixed set of gauge families and renders
//! families in Prometheus text exposition format (version 0.0.4).

use std::fmt::Write;

use crate::reading::Reading;

pub const PARTICULATE_MATTER: &str = "kaiterra_particulate_matter";
pub const TEMPERATURE: &str = "kaiterra_temperature_celsius";
pub const HUMIDITY: &str = "kaiterra_humidity";
pub const TIMESTAMP: &str = "kaiterra_timestamp_seconds";
pub const TVOC: &str = "kaiterra_total_volatile_organic_compounds_ppb";

/// Content type of [`render_prometheus`] output.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricType {
    Gauge,
    Counter,
}

impl MetricType {
    fn as_str(self) -> &'static str {
        match self {
            MetricType::Gauge => "gauge",
            MetricType::Counter => "counter",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub labels: Vec<(&'static str, String)>,
    pub value: f64,
}

impl Sample {
    pub fn unlabeled(value: f64) -> Self {
        Self {
            labels: Vec::new(),
            value,
        }
    }
}

/// One metric name with its help text, type and samples.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricFamily {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricType,
    pub samples: Vec<Sample>,
}

impl MetricFamily {
    pub fn gauge(name: &'static str, help: &'static str, value: f64) -> Self {
        Self {
            name,
            help,
            kind: MetricType::Gauge,
            samples: vec![Sample::unlabeled(value)],
        }
    }

    pub fn counter(name: &'static str, help: &'static str, value: f64) -> Self {
        Self {
            kind: MetricType::Counter,
            ..Self::gauge(name, help, value)
        }
    }
}

// ── Reading → families ──────────────────────────────────────────────

/// Convert a reading into gauge families.
///
/// Produces five samples, or six when the device reports TVOC. An
/// unparseable timestamp is reported as `0` rather than dropping the
/// scrape, so the set of series stays stable.
pub fn reading_metrics(reading: &Reading) -> Vec<MetricFamily> {
    let mut families = Vec::with_capacity(5);

    families.push(MetricFamily {
        name: PARTICULATE_MATTER,
        help: "PM2.5 or PM10 (µg/m³), post-calibration",
        kind: MetricType::Gauge,
        samples: vec![
            Sample {
                labels: vec![("microns", "10".into())],
                value: reading.pm10,
            },
            Sample {
                labels: vec![("microns", "2.5".into())],
                value: reading.pm25,
            },
        ],
    });
    families.push(MetricFamily::gauge(
        TEMPERATURE,
        "temperature in Celsius",
        reading.temperature,
    ));
    families.push(MetricFamily::gauge(
        HUMIDITY,
        "relative humidity in % (0-100)",
        reading.humidity,
    ));

    let ts = match reading.measured_at() {
        Ok(t) => t.timestamp(),
        Err(e) => {
            tracing::warn!(
                timestamp = %reading.timestamp,
                error = %e,
                "couldn't parse reading timestamp, reporting 0"
            );
            0
        }
    };
    families.push(MetricFamily::gauge(
        TIMESTAMP,
        "Timestamp was measured at. Unix seconds.",
        ts as f64,
    ));

    if reading.has_tvoc() {
        families.push(MetricFamily::gauge(
            TVOC,
            "Total Volatile Organic Compounds (TVOC) in ppb",
            reading.tvoc,
        ));
    }

    families
}

// ── Rendering ───────────────────────────────────────────────────────

/// Render families as Prometheus text exposition format.
///
/// Families without samples are omitted entirely.
pub fn render_prometheus(families: &[MetricFamily]) -> String {
    let mut out = String::with_capacity(1024);

    for family in families.iter().filter(|f| !f.samples.is_empty()) {
        writeln!(out, "# HELP {} {}", family.name, escape_help(family.help)).unwrap();
        writeln!(out, "# TYPE {} {}", family.name, family.kind.as_str()).unwrap();
        for sample in &family.samples {
            out.push_str(family.name);
            if !sample.labels.is_empty() {
                out.push('{');
                for (i, (k, v)) in sample.labels.iter().enumerate() {
                    if i > 0 {
                        out.push(',');
                    }
                    write!(out, "{k}=\"{}\"", escape_label_value(v)).unwrap();
                }
                out.push('}');
            }
            writeln!(out, " {}", format_value(sample.value)).unwrap();
        }
    }

    out
}

fn format_value(v: f64) -> String {
    if v.is_nan() {
        "NaN".into()
    } else if v == f64::INFINITY {
        "+Inf".into()
    } else if v == f64::NEG_INFINITY {
        "-Inf".into()
    } else {
        v.to_string()
    }
}

fn escape_help(s: &str) -> String {
    s.replace('\\', "\\\\").replace('\n', "\\n")
}

fn escape_label_value(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\n', "\\n")
}
