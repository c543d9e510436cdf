//! Schema-mapped decoding of Kaiterra API payloads.
//!
//! The vendor nests the reading under keys whose names (and casing) drift
//! between device models, so instead of a fixed struct layout each
//! [`Reading`] field is located through a path of object keys.
//!
//! Decoding is forgiving about absence: a missing key or an explicit `null`
//! yields the zero value. It is strict about shape: a value of the wrong JSON
//! type is an error.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::reading::Reading;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("expected an object at `{path}`, found {found}")]
    NotAnObject { path: String, found: &'static str },
    #[error("expected a {expected} at `{path}`, found {found}")]
    WrongType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
}

// ── Schema table ────────────────────────────────────────────────────

/// A path of object keys from the payload root to a value.
pub type FieldPath = &'static [&'static str];

/// Where each [`Reading`] field lives in an upstream payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Schema {
    pub device_id: FieldPath,
    pub timestamp: FieldPath,
    pub humidity: FieldPath,
    pub pm10: FieldPath,
    pub pm25: FieldPath,
    pub temperature: FieldPath,
    pub tvoc: FieldPath,
}

impl Schema {
    /// Layout of the v1 device endpoints (`/v1/lasereggs/{uuid}`).
    ///
    /// ```json
    /// {"id": "...", "info.aqi": {"ts": "2016-12-07T05:32:16Z",
    ///   "data": {"humidity": 55, "pm10": 12.3, "pm25": 4.5, "temp": 21,
    ///            "st03.rtvoc": 120.5}}}
    /// ```
    pub const KAITERRA_V1: Schema = Schema {
        device_id: &["id"],
        timestamp: &["info.aqi", "ts"],
        humidity: &["info.aqi", "data", "humidity"],
        pm10: &["info.aqi", "data", "pm10"],
        pm25: &["info.aqi", "data", "pm25"],
        temperature: &["info.aqi", "data", "temp"],
        tvoc: &["info.aqi", "data", "st03.rtvoc"],
    };

    /// Decode a raw response body.
    pub fn decode(&self, body: &[u8]) -> Result<Reading, DecodeError> {
        let root: Value = serde_json::from_slice(body)?;
        self.decode_value(&root)
    }

    /// Decode an already-parsed JSON document.
    pub fn decode_value(&self, root: &Value) -> Result<Reading, DecodeError> {
        if !root.is_object() {
            return Err(DecodeError::NotAnObject {
                path: display_path(&[]),
                found: json_type(root),
            });
        }

        Ok(Reading {
            device_id: string_at(root, self.device_id)?,
            timestamp: string_at(root, self.timestamp)?,
            humidity: number_at(root, self.humidity)?,
            pm25: number_at(root, self.pm25)?,
            pm10: number_at(root, self.pm10)?,
            temperature: number_at(root, self.temperature)?,
            tvoc: number_at(root, self.tvoc)?,
        })
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::KAITERRA_V1
    }
}

// ── Lookup helpers ──────────────────────────────────────────────────

fn lookup<'a>(root: &'a Value, path: FieldPath) -> Result<Option<&'a Value>, DecodeError> {
    let mut current = root;
    for (depth, key) in path.iter().enumerate() {
        let map = match current {
            Value::Object(map) => map,
            Value::Null => return Ok(None),
            other => {
                return Err(DecodeError::NotAnObject {
                    path: display_path(&path[..depth]),
                    found: json_type(other),
                });
            }
        };
        match find_key(map, key) {
            Some(v) => current = v,
            None => return Ok(None),
        }
    }
    Ok(Some(current))
}

/// Exact match first, then ASCII case-insensitive.
fn find_key<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).or_else(|| {
        map.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    })
}

fn number_at(root: &Value, path: FieldPath) -> Result<f64, DecodeError> {
    match lookup(root, path)? {
        None | Some(Value::Null) => Ok(0.0),
        Some(Value::Number(n)) => Ok(n.as_f64().unwrap_or_default()),
        Some(other) => Err(DecodeError::WrongType {
            path: display_path(path),
            expected: "number",
            found: json_type(other),
        }),
    }
}

fn string_at(root: &Value, path: FieldPath) -> Result<String, DecodeError> {
    match lookup(root, path)? {
        None | Some(Value::Null) => Ok(String::new()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(other) => Err(DecodeError::WrongType {
            path: display_path(path),
            expected: "string",
            found: json_type(other),
        }),
    }
}

fn display_path(path: &[&str]) -> String {
    if path.is_empty() {
        return "/".into();
    }
    path.iter().map(|k| format!("/{k}")).collect()
}

fn json_type(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
