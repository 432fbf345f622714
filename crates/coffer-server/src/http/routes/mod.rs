use axum::Router;

use crate::app::AppState;

pub(crate) mod health;
pub mod v1;

pub fn router() -> Router<AppState> {
    Router::new().merge(health::router()).merge(v1::router())
}
