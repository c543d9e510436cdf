//! Scrape-path integration tests for kaiterra-exporter.
//!
//! These tests exercise the router through axum's tower service interface
//! (no TCP on the exporter side) against a wiremock stand-in for the
//! Kaiterra API.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use clap::Parser;
use http_body_util::BodyExt;
use tower::ServiceExt;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use kaiterra_exporter::api;
use kaiterra_exporter::config::{Cli, Config};
use kaiterra_exporter::state::AppState;

const DEVICE: &str = "00000000-0001-0001-0000-00007e57c0de";
const KEY: &str = "test-key";

/// Build a test app pointed at the mock upstream.
fn test_app(server: &MockServer) -> Router {
    let api_url = format!("{}/v1/lasereggs/", server.uri());
    let cli = Cli::try_parse_from([
        "kaiterra-exporter",
        "--api-key",
        KEY,
        "--device-uuid",
        DEVICE,
        "--api-url",
        &api_url,
    ])
    .unwrap();
    let config = Config::from_cli(cli).unwrap();
    let state = AppState::new(config).unwrap();
    api::router(&state.config().metrics_path).with_state(state)
}

fn payload(ts: &str, tvoc: f64) -> serde_json::Value {
    serde_json::json!({
        "id": DEVICE,
        "info.aqi": {
            "ts": ts,
            "data": {
                "humidity": 55.0,
                "pm10": 12.3,
                "pm25": 4.5,
                "temp": 21.0,
                "st03.rtvoc": tvoc
            }
        }
    })
}

async fn mount(server: &MockServer, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path(format!("/v1/lasereggs/{DEVICE}")))
        .and(query_param("key", KEY))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn get(app: Router, uri: &str) -> (StatusCode, Option<String>, String) {
    let resp = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = resp.status();
    let content_type = resp
        .headers()
        .get(header::CONTENT_TYPE)
        .map(|v| v.to_str().unwrap().to_string());
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    (status, content_type, String::from_utf8(bytes.to_vec()).unwrap())
}

/// Sample lines belonging to the reading gauges (not process/build metrics).
fn reading_samples(body: &str) -> Vec<&str> {
    body.lines()
        .filter(|l| !l.starts_with('#'))
        .filter(|l| l.starts_with("kaiterra_") && !l.starts_with("kaiterra_exporter_"))
        .collect()
}

fn sample_value(body: &str, series: &str) -> Option<f64> {
    body.lines()
        .find_map(|l| l.strip_prefix(series)?.strip_prefix(' '))
        .map(|v| v.parse().unwrap())
}

#[tokio::test]
async fn five_samples_without_tvoc() {
    let server = MockServer::start().await;
    mount(
        &server,
        ResponseTemplate::new(200).set_body_json(payload("2016-12-07T05:32:16Z", 0.0)),
    )
    .await;

    let (status, content_type, body) = get(test_app(&server), "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        content_type.as_deref(),
        Some("text/plain; version=0.0.4; charset=utf-8")
    );

    let samples = reading_samples(&body);
    assert_eq!(samples.len(), 5, "{body}");
    assert!(!body.contains("kaiterra_total_volatile_organic_compounds_ppb"));

    assert_eq!(
        sample_value(&body, "kaiterra_particulate_matter{microns=\"10\"}"),
        Some(12.3)
    );
    assert_eq!(
        sample_value(&body, "kaiterra_particulate_matter{microns=\"2.5\"}"),
        Some(4.5)
    );
    assert_eq!(sample_value(&body, "kaiterra_temperature_celsius"), Some(21.0));
    assert_eq!(sample_value(&body, "kaiterra_humidity"), Some(55.0));
    assert_eq!(
        sample_value(&body, "kaiterra_timestamp_seconds"),
        Some(1_481_088_736.0)
    );
}

#[tokio::test]
async fn six_samples_with_tvoc() {
    let server = MockServer::start().await;
    mount(
        &server,
        ResponseTemplate::new(200).set_body_json(payload("2016-12-07T05:32:16Z", 120.5)),
    )
    .await;

    let (_, _, body) = get(test_app(&server), "/metrics").await;
    assert_eq!(reading_samples(&body).len(), 6, "{body}");
    assert_eq!(
        sample_value(&body, "kaiterra_total_volatile_organic_compounds_ppb"),
        Some(120.5)
    );
}

#[tokio::test]
async fn upstream_500_yields_no_reading_samples() {
    let server = MockServer::start().await;
    mount(&server, ResponseTemplate::new(500)).await;

    let app = test_app(&server);
    let (status, _, body) = get(app.clone(), "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(reading_samples(&body).is_empty(), "{body}");
    assert!(body.contains("kaiterra_exporter_build_info{"));

    // The server keeps answering after an upstream failure.
    let (status, _, _) = get(app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn malformed_json_yields_no_reading_samples() {
    let server = MockServer::start().await;
    mount(
        &server,
        ResponseTemplate::new(200).set_body_string("{\"info.aqi\": {\"data\": "),
    )
    .await;

    let (status, _, body) = get(test_app(&server), "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(reading_samples(&body).is_empty(), "{body}");
}

#[tokio::test]
async fn unreachable_upstream_yields_no_reading_samples() {
    let server = MockServer::start().await;
    let app = test_app(&server);
    drop(server);

    let (status, _, body) = get(app, "/metrics").await;
    assert_eq!(status, StatusCode::OK);
    assert!(reading_samples(&body).is_empty(), "{body}");
}

#[tokio::test]
async fn bad_timestamp_reports_zero() {
    let server = MockServer::start().await;
    mount(
        &server,
        ResponseTemplate::new(200).set_body_json(payload("not-a-date", 0.0)),
    )
    .await;

    let (_, _, body) = get(test_app(&server), "/metrics").await;
    assert_eq!(reading_samples(&body).len(), 5, "{body}");
    assert_eq!(sample_value(&body, "kaiterra_timestamp_seconds"), Some(0.0));
    assert_eq!(sample_value(&body, "kaiterra_humidity"), Some(55.0));
}

#[tokio::test]
async fn every_scrape_fetches_upstream() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(payload("2016-12-07T05:32:16Z", 0.0)),
        )
        .expect(3)
        .mount(&server)
        .await;

    let app = test_app(&server);
    let (a, b) = tokio::join!(get(app.clone(), "/metrics"), get(app.clone(), "/metrics"));
    assert_eq!(reading_samples(&a.2).len(), 5);
    assert_eq!(reading_samples(&b.2).len(), 5);
    get(app, "/metrics").await;
}

#[tokio::test]
async fn process_metrics_are_served() {
    let server = MockServer::start().await;
    mount(&server, ResponseTemplate::new(503)).await;

    let (_, _, body) = get(test_app(&server), "/metrics").await;
    assert!(body.contains("# TYPE process_resident_memory_bytes gauge"));
    assert!(body.contains("# TYPE process_cpu_seconds_total counter"));
}

#[tokio::test]
async fn landing_page_links_to_metrics() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (status, content_type, body) = get(test_app(&server), "/").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type.as_deref(), Some("text/html; charset=utf-8"));
    assert!(body.contains("<title>Kaiterra Laser Egg Exporter</title>"));
    assert!(body.contains("<a href=\"/metrics\">Metrics</a>"));
}

#[tokio::test]
async fn other_paths_serve_landing_page() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let app = test_app(&server);
    for uri in ["/index.html", "/nope/deeper", "/metrics/extra"] {
        let (status, content_type, body) = get(app.clone(), uri).await;
        assert_eq!(status, StatusCode::OK, "{uri}");
        assert_eq!(content_type.as_deref(), Some("text/html; charset=utf-8"));
        assert!(body.contains("<a href=\"/metrics\">Metrics</a>"), "{uri}");
    }
}
