use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::app::AppState;
use crate::domains::errors;

/// Resolves the bearer token into an [`coffer_core::Identity`] or answers 401
/// before the handler runs.
pub async fn auth_middleware(mut request: Request<Body>, next: Next) -> Response {
    let Some(state) = request.extensions().get::<AppState>().cloned() else {
        tracing::error!(event = "auth_state_missing", "AppState extension missing");
        return errors::internal();
    };
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|value| value.to_str().ok());

    let token = match auth_header.and_then(|value| value.strip_prefix("Bearer ")) {
        Some(token) if !token.trim().is_empty() => token.trim(),
        _ => {
            tracing::debug!(event = "auth_failed", reason = "token_missing");
            return errors::unauthenticated();
        }
    };

    let identity = match state.tokens.verify(token) {
        Ok(identity) => identity,
        Err(err) => {
            tracing::warn!(event = "auth_failed", reason = %err, "Access token rejected");
            return errors::unauthenticated();
        }
    };

    tracing::Span::current().record("user_id", identity.user_id.to_string());
    request.extensions_mut().insert(identity);
    next.run(request).await
}
