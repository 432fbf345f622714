use axum::{middleware, Router};

use crate::app::AppState;

pub fn router() -> Router<AppState> {
    // Matched entry routes only run behind a verified bearer token; unknown
    // paths still fall through to 404.
    let protected = Router::new()
        .merge(crate::domains::entries::http::v1::router())
        .route_layer(middleware::from_fn(
            crate::domains::auth::core::auth_middleware,
        ));

    Router::new()
        .merge(crate::domains::auth::http::v1::router())
        .merge(protected)
}
