//! Sensor reading model.

use chrono::{DateTime, Utc};

/// A single point-in-time sample reported by a Kaiterra device.
///
/// Fields that the upstream payload omits are left at their zero value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reading {
    /// 128-bit device UUID as reported upstream.
    pub device_id: String,
    /// RFC 3339 measurement time, e.g. `2016-12-07T05:32:16Z`.
    pub timestamp: String,
    /// Relative humidity in % (0-100).
    pub humidity: f64,
    /// PM2.5 in µg/m³, post-calibration.
    pub pm25: f64,
    /// PM10 in µg/m³, post-calibration.
    pub pm10: f64,
    /// Temperature in Celsius.
    pub temperature: f64,
    /// Total volatile organic compounds in ppb. Zero when the device model
    /// has no TVOC sensor.
    pub tvoc: f64,
}

impl Reading {
    /// Parse the measurement time.
    pub fn measured_at(&self) -> Result<DateTime<Utc>, chrono::ParseError> {
        DateTime::parse_from_rfc3339(&self.timestamp).map(|t| t.with_timezone(&Utc))
    }

    /// Whether the device reported a TVOC value on this reading.
    pub fn has_tvoc(&self) -> bool {
        self.tvoc != 0.0
    }
}
