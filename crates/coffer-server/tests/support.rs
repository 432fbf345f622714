#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use coffer_crypto::{Cipher, KdfParams, SecretKey};
use coffer_db::{migrate, PgPool};
use coffer_server::app::{build_router, AppState};
use coffer_server::config::ServerConfig;
use coffer_server::settings::DbTxIsolation;
use coffer_server::tokens::TokenIssuer;
use serde_json::{json, Value};
use sqlx_core::pool::PoolOptions;
use sqlx_postgres::{PgConnectOptions, Postgres};
use std::env;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tower::ServiceExt;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

pub const JWT_SECRET: &[u8] = b"integration-test-secret-0123456789";

fn init_test_tracing() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new("coffer_server=debug"))
            .with_test_writer()
            .try_init();
    });
}

pub async fn setup_db() -> PgPool {
    init_test_tracing();
    let db_url =
        env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL must be set for Postgres tests");
    let schema = format!("coffer_test_{}", Uuid::now_v7().simple());
    let admin_options =
        PgConnectOptions::from_str(&db_url).expect("failed to parse TEST_DATABASE_URL");
    let admin_pool = PoolOptions::new()
        .max_connections(1)
        .connect_with(admin_options.clone())
        .await
        .expect("connect admin pool");

    sqlx_core::query::query::<Postgres>(&format!("CREATE SCHEMA \"{}\"", schema))
        .execute(&admin_pool)
        .await
        .expect("create schema");

    let options = admin_options.options([("search_path", schema.as_str())]);
    let pool = PoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .expect("connect test pool");

    migrate(&pool).await.expect("migrate");
    pool
}

/// Pool that never connects unless a handler actually touches the database.
pub fn lazy_pool() -> PgPool {
    init_test_tracing();
    PoolOptions::new()
        .max_connections(1)
        .acquire_timeout(std::time::Duration::from_millis(200))
        .connect_lazy_with(PgConnectOptions::new().host("127.0.0.1").port(1))
}

pub fn test_state(pool: PgPool) -> AppState {
    let mut config = ServerConfig::default();
    config.auth.kdf.iterations = 1;
    config.auth.kdf.memory_kb = 8;
    config.auth.kdf.parallelism = 1;
    AppState {
        db: pool,
        db_tx_isolation: DbTxIsolation::ReadCommitted,
        started_at: Instant::now(),
        cipher: Arc::new(Cipher::from_key(&SecretKey::generate())),
        tokens: Arc::new(TokenIssuer::new(JWT_SECRET, 3600)),
        password_pepper: "pepper".to_string(),
        kdf_params: KdfParams {
            memory_kb: 8,
            iterations: 1,
            parallelism: 1,
        },
        argon2_semaphore: Arc::new(Semaphore::new(4)),
        config,
    }
}

pub struct TestApp {
    pub app: axum::Router,
    pub state: AppState,
}

impl TestApp {
    pub fn new(state: AppState) -> Self {
        Self {
            app: build_router(state.clone()),
            state,
        }
    }

    pub async fn with_db() -> Self {
        Self::new(test_state(setup_db().await))
    }

    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header("authorization", format!("Bearer {token}"));
        }
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(serde_json::to_vec(&body).expect("encode json")))
                .expect("request"),
            None => builder.body(Body::empty()).expect("request"),
        };
        let response = self.app.clone().oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("body");
        let json = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, json)
    }

    /// Registers `login` and returns a fresh access token.
    pub async fn login_as(&self, login: &str) -> String {
        let credentials = json!({ "login": login, "password": "correct horse battery" });
        let (status, body) = self
            .send(
                Method::POST,
                "/v1/auth/register",
                None,
                Some(credentials.clone()),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "register failed: {body:?}");
        let (status, body) = self
            .send(Method::POST, "/v1/auth/login", None, Some(credentials))
            .await;
        assert_eq!(status, StatusCode::OK, "login failed: {body:?}");
        body["access_token"]
            .as_str()
            .expect("access token")
            .to_string()
    }
}

pub fn b64(value: &str) -> String {
    use base64::Engine;
    base64::engine::general_purpose::STANDARD.encode(value.as_bytes())
}
