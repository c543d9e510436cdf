//! Landing page at `/`.

use axum::extract::State;
use axum::response::Html;

use crate::state::AppState;

/// Handler for `GET /`.
pub async fn handler(State(state): State<AppState>) -> Html<String> {
    Html(render(&state.config().metrics_path))
}

// metrics_path is restricted to URL-safe characters by config validation,
// so it needs no HTML escaping.
fn render(metrics_path: &str) -> String {
    format!(
        "<!doctype html>
<title>Kaiterra Laser Egg Exporter</title>
<h1>Kaiterra Laser Egg Exporter</h1>
<a href=\"{metrics_path}\">Metrics</a>"
    )
}
