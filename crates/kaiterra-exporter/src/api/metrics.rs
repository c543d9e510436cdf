//! Prometheus metrics endpoint.
//!
//! `GET /metrics` — fetches the device's latest reading from upstream and
//! renders it with process and build metrics in Prometheus text exposition
//! format. Every scrape performs its own upstream request.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;

use kaiterra_common::metrics::{CONTENT_TYPE, MetricFamily, reading_metrics, render_prometheus};

use crate::process::build_info;
use crate::state::AppState;

/// Handler for `GET /metrics`.
///
/// Upstream failures are logged and only suppress the reading gauges; the
/// scrape itself still succeeds.
pub async fn handler(State(state): State<AppState>) -> impl IntoResponse {
    let families = collect(&state).await;
    ([(header::CONTENT_TYPE, CONTENT_TYPE)], render_prometheus(&families))
}

/// Gather every metric family for one scrape.
pub async fn collect(state: &AppState) -> Vec<MetricFamily> {
    let mut families = match state.fetcher().fetch().await {
        Ok(reading) => reading_metrics(&reading),
        Err(e) => {
            tracing::warn!(
                device_uuid = %state.config().device_uuid,
                error = %e,
                "upstream fetch failed, skipping reading metrics"
            );
            Vec::new()
        }
    };

    families.push(build_info());
    families.extend(state.process().collect());
    families
}
