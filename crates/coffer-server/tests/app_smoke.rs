use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use coffer_server::bootstrap::build_app;
use coffer_server::config::MetricsConfig;
use coffer_server::infra::metrics;
use tower::ServiceExt;

mod support;

use support::{lazy_pool, test_state};

fn metrics_enabled() -> MetricsConfig {
    MetricsConfig {
        enabled: true,
        endpoint: "/metrics".to_string(),
    }
}

#[tokio::test]
async fn metrics_endpoint_exports_entry_counters() {
    metrics::entry_operation("create", "ok");
    let app = build_app(&metrics_enabled(), test_state(lazy_pool()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let text = String::from_utf8(body.to_vec()).expect("utf8");
    assert!(text.contains("coffer_entry_operations_total"));
}

#[tokio::test]
async fn metrics_route_absent_when_disabled() {
    let config = MetricsConfig {
        enabled: false,
        ..metrics_enabled()
    };
    let app = build_app(&config, test_state(lazy_pool()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/metrics")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unknown_paths_are_not_found_without_token() {
    let app = build_app(&metrics_enabled(), test_state(lazy_pool()));

    for uri in ["/v1/typo", "/v1/entries/diff/extra", "/nope"] {
        let response = app
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).expect("request"))
            .await
            .expect("response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
    }

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/entries")
                .method("POST")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn responses_carry_request_id() {
    let app = build_app(&metrics_enabled(), test_state(lazy_pool()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/v1/entries/diff")
                .method("POST")
                .header("x-request-id", "req-42")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response
            .headers()
            .get("x-request-id")
            .and_then(|value| value.to_str().ok()),
        Some("req-42")
    );
}

#[tokio::test]
async fn health_reports_unreachable_database() {
    let app = build_app(&metrics_enabled(), test_state(lazy_pool()));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body");
    let json: serde_json::Value = serde_json::from_slice(&body).expect("json");
    assert_eq!(json["status"], "db_error");
    assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
#[cfg_attr(not(feature = "postgres-tests"), ignore = "requires TEST_DATABASE_URL")]
async fn health_ok_with_database() {
    let app = build_app(&metrics_enabled(), test_state(support::setup_db().await));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .expect("request"),
        )
        .await
        .expect("response");
    assert_eq!(response.status(), StatusCode::OK);
}
