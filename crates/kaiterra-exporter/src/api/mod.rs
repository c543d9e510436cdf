//! HTTP route tree.

pub mod index;
pub mod metrics;

use axum::Router;
use axum::routing::get;

use crate::state::AppState;

/// Build the exporter router: the scrape endpoint plus a landing page.
///
/// Every path other than the metrics path serves the landing page.
pub fn router(metrics_path: &str) -> Router<AppState> {
    Router::new()
        .route("/", get(index::handler))
        .route(metrics_path, get(metrics::handler))
        .fallback(index::handler)
}
