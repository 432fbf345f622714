use axum::{
    routing::{get, post},
    Router,
};

use crate::app::AppState;

mod handlers;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/entries", post(handlers::create_entry))
        .route("/v1/entries/diff", post(handlers::get_entries_diff))
        .route(
            "/v1/entries/:entry_id",
            get(handlers::get_entry)
                .put(handlers::update_entry)
                .delete(handlers::delete_entry),
        )
}
