use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use coffer_core::api::ErrorResponse;
use coffer_core::ValidationErrors;

pub fn error_response(status: StatusCode, error: &str, details: Vec<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            details,
        }),
    )
        .into_response()
}

/// 400 `invalid_argument` carrying every violation code.
pub fn invalid_argument(errors: &ValidationErrors) -> Response {
    error_response(
        StatusCode::BAD_REQUEST,
        "invalid_argument",
        errors.codes().iter().map(|code| (*code).to_string()).collect(),
    )
}

pub fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "not_found", Vec::new())
}

pub fn unauthenticated() -> Response {
    error_response(StatusCode::UNAUTHORIZED, "unauthenticated", Vec::new())
}

pub fn already_exists(code: &str) -> Response {
    error_response(StatusCode::CONFLICT, "already_exists", vec![code.to_string()])
}

pub fn internal() -> Response {
    error_response(StatusCode::INTERNAL_SERVER_ERROR, "internal", Vec::new())
}
