use axum::{extract::DefaultBodyLimit, Extension, Router};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;

use crate::config::ServerConfig;
use crate::domains::auth::core::tokens::TokenIssuer;
use crate::settings::DbTxIsolation;
use coffer_crypto::{Cipher, KdfParams};
use coffer_db::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub db_tx_isolation: DbTxIsolation,
    pub started_at: Instant,
    /// Seals entry payloads at rest.
    pub cipher: Arc<Cipher>,
    pub tokens: Arc<TokenIssuer>,
    pub password_pepper: String,
    pub kdf_params: KdfParams,
    pub argon2_semaphore: Arc<Semaphore>,
    pub config: ServerConfig,
}

pub fn build_router(state: AppState) -> Router {
    let extension_state = state.clone();
    let max_body_bytes = state.config.limits.max_body_bytes;
    crate::http::router()
        .with_state(state)
        .layer(Extension(extension_state))
        .layer(DefaultBodyLimit::max(max_body_bytes))
}
