//! Shared types for the Kaiterra exporter.
//!
//! This crate contains:
//! - **Reading** — one decoded sensor sample
//! - **Schema** — the JSON path table used to decode vendor payloads
//! - **Metrics** — gauge families and Prometheus text rendering

pub mod metrics;
pub mod reading;
pub mod schema;

pub use reading::Reading;
pub use schema::{DecodeError, Schema};
