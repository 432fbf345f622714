use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::Serialize;

use crate::app::AppState;

#[derive(Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) status: &'static str,
    pub(crate) version: &'static str,
    pub(crate) uptime_seconds: u64,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let uptime_seconds = state.started_at.elapsed().as_secs();
    let version = env!("CARGO_PKG_VERSION");

    let db_ok = sqlx_core::query::query::<sqlx_postgres::Postgres>("SELECT 1")
        .execute(&state.db)
        .await
        .is_ok();
    let (status_code, status) = if db_ok {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "db_error")
    };
    (
        status_code,
        Json(HealthResponse {
            status,
            version,
            uptime_seconds,
        }),
    )
}
