use axum::{routing::post, Router};

use crate::app::AppState;

mod handlers;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/auth/register", post(handlers::register))
        .route("/v1/auth/login", post(handlers::login))
}
