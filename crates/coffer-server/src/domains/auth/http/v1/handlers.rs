use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use coffer_core::api::auth::{LoginRequest, RegisterRequest};

use crate::app::AppState;
use crate::domains::auth::service::{self, AuthError};
use crate::domains::errors;

fn map_auth_error(error: AuthError) -> axum::response::Response {
    match error {
        AuthError::Invalid(violations) => errors::invalid_argument(&violations),
        AuthError::AlreadyExists(code) => errors::already_exists(code),
        AuthError::InvalidCredentials => errors::unauthenticated(),
        AuthError::Db | AuthError::Internal(_) => errors::internal(),
    }
}

pub(super) async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> impl IntoResponse {
    match service::register(&state, &payload).await {
        Ok(body) => (StatusCode::CREATED, Json(body)).into_response(),
        Err(err) => map_auth_error(err),
    }
}

pub(super) async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> impl IntoResponse {
    match service::login(&state, &payload).await {
        Ok(body) => (StatusCode::OK, Json(body)).into_response(),
        Err(err) => map_auth_error(err),
    }
}
