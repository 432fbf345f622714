use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{middleware, Router};
use coffer_crypto::Cipher;
use coffer_db::{connect_postgres_with_max, PgPool};
use prometheus::Encoder;
use tokio::sync::Semaphore;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::app::{self, AppState};
use crate::config::MetricsConfig;
use crate::domains::auth::core::tokens::TokenIssuer;
use crate::infra::metrics;
use crate::runtime;
use crate::settings::Settings;

const KDF_CONCURRENCY: usize = 4;

pub fn log_startup(settings: &Settings) {
    tracing::info!(
        event = "server_startup",
        addr = %settings.addr,
        db_pool_max = settings.db_pool_max,
        db_tx_isolation = ?settings.db_tx_isolation,
        token_ttl_seconds = settings.config.auth.token_ttl_seconds,
        max_body_bytes = settings.config.limits.max_body_bytes,
        metrics_enabled = settings.config.metrics.enabled,
        pepper_set = !settings.password_pepper.is_empty(),
        "Server configuration loaded"
    );
}

pub fn init_metrics_registry(metrics_config: &MetricsConfig) {
    if !metrics_config.enabled {
        return;
    }
    #[cfg(target_os = "linux")]
    {
        let process_collector = prometheus::process_collector::ProcessCollector::for_self();
        if prometheus::default_registry()
            .register(Box::new(process_collector))
            .is_err()
        {
            tracing::warn!(event = "process_metrics_failed", "failed to register process metrics");
        }
    }
}

pub async fn connect_db(settings: &Settings) -> Result<PgPool, sqlx_core::Error> {
    connect_postgres_with_max(&settings.db_url, settings.db_pool_max).await
}

pub fn build_state(settings: &Settings, db: PgPool) -> Result<AppState, &'static str> {
    let key = settings
        .encryption_key
        .as_ref()
        .ok_or("encryption key missing")?;
    Ok(AppState {
        db,
        db_tx_isolation: settings.db_tx_isolation,
        started_at: Instant::now(),
        cipher: Arc::new(Cipher::from_key(key)),
        tokens: Arc::new(TokenIssuer::new(
            settings.jwt_secret.as_bytes(),
            settings.config.auth.token_ttl_seconds,
        )),
        password_pepper: settings.password_pepper.clone(),
        kdf_params: settings.config.auth.kdf.params(),
        argon2_semaphore: Arc::new(Semaphore::new(KDF_CONCURRENCY)),
        config: settings.config.clone(),
    })
}

fn metrics_response() -> axum::response::Response {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(err) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::warn!(event = "metrics_encode_failed", error = %err);
    }
    let mut response = axum::response::Response::new(axum::body::Body::from(buffer));
    if let Ok(value) = axum::http::HeaderValue::from_str(encoder.format_type()) {
        response
            .headers_mut()
            .insert(axum::http::header::CONTENT_TYPE, value);
    }
    response
}

pub fn build_app(metrics_config: &MetricsConfig, state: AppState) -> Router {
    let request_id_header = axum::http::HeaderName::from_static("x-request-id");
    let mut app = app::build_router(state);
    if metrics_config.enabled {
        app = app.route_layer(middleware::from_fn(metrics::http_metrics));
        app = app.route(
            &metrics_config.endpoint,
            axum::routing::get(|| async { metrics_response() }),
        );
    }
    app.layer(
        TraceLayer::new_for_http().make_span_with(|request: &axum::http::Request<_>| {
            let request_id = request
                .headers()
                .get("x-request-id")
                .and_then(|value| value.to_str().ok())
                .unwrap_or("unknown");
            let matched = request
                .extensions()
                .get::<axum::extract::MatchedPath>()
                .map(axum::extract::MatchedPath::as_str)
                .unwrap_or("unmatched");
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                path = %matched,
                request_id = %request_id,
                user_id = tracing::field::Empty
            )
        }),
    )
    .layer(PropagateRequestIdLayer::new(request_id_header.clone()))
    .layer(SetRequestIdLayer::new(request_id_header, MakeRequestUuid))
    .layer(CatchPanicLayer::custom(|err| {
        tracing::error!(event = "panic_recovered", error = ?err, "handler panicked");
        crate::domains::errors::internal()
    }))
}

pub async fn serve(settings: &Settings, app: Router) {
    let addr: SocketAddr = settings.addr;
    tracing::info!(event = "server_listening", %addr, "listening");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(event = "server_bind_failed", error = %err);
            return;
        }
    };
    if let Err(err) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(runtime::shutdown_signal())
    .await
    {
        tracing::error!(event = "server_failed", error = %err);
    }
}
