use chrono::Utc;
use coffer_core::api::auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use coffer_core::{User, ValidationErrors, MIN_PASSWORD_LEN};
use coffer_db::repo::UserRepo;
use thiserror::Error;
use uuid::Uuid;

use crate::app::AppState;
use crate::infra::metrics;

pub const MAX_LOGIN_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid_argument: {0}")]
    Invalid(ValidationErrors),
    #[error("already_exists: {0}")]
    AlreadyExists(&'static str),
    #[error("invalid_credentials")]
    InvalidCredentials,
    #[error("db_error")]
    Db,
    #[error("internal: {0}")]
    Internal(&'static str),
}

fn validate_credentials(login: &str, password: &str) -> Result<String, ValidationErrors> {
    let mut errors = ValidationErrors::new();
    let login = login.trim();
    if login.is_empty() {
        errors.push("login_required");
    } else if login.len() > MAX_LOGIN_LEN {
        errors.push("login_too_long");
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        errors.push("password_too_short");
    }
    errors.into_result()?;
    Ok(login.to_string())
}

async fn hash_password(state: &AppState, password: String) -> Result<String, AuthError> {
    let _permit = state
        .argon2_semaphore
        .acquire()
        .await
        .map_err(|_| AuthError::Internal("kdf_unavailable"))?;
    let pepper = state.password_pepper.clone();
    let params = state.kdf_params;
    tokio::task::spawn_blocking(move || {
        coffer_crypto::hash_password(&password, &pepper, &params)
    })
    .await
    .map_err(|_| AuthError::Internal("kdf_join_failed"))?
    .map_err(AuthError::Internal)
}

async fn verify_password(
    state: &AppState,
    stored: String,
    password: String,
) -> Result<bool, AuthError> {
    let _permit = state
        .argon2_semaphore
        .acquire()
        .await
        .map_err(|_| AuthError::Internal("kdf_unavailable"))?;
    let pepper = state.password_pepper.clone();
    tokio::task::spawn_blocking(move || {
        coffer_crypto::verify_password(&stored, &password, &pepper)
    })
    .await
    .map_err(|_| AuthError::Internal("kdf_join_failed"))?
    .map_err(AuthError::Internal)
}

pub async fn register(
    state: &AppState,
    payload: &RegisterRequest,
) -> Result<RegisterResponse, AuthError> {
    let login = match validate_credentials(&payload.login, &payload.password) {
        Ok(login) => login,
        Err(errors) => {
            metrics::auth_register("invalid");
            return Err(AuthError::Invalid(errors));
        }
    };
    let password_hash = match hash_password(state, payload.password.clone()).await {
        Ok(hash) => hash,
        Err(err) => {
            metrics::auth_register("error");
            tracing::error!(
                event = "auth_register_failed",
                reason = "kdf_error",
                error = %err,
                "Registration failed"
            );
            return Err(err);
        }
    };
    let user = User {
        id: Uuid::now_v7(),
        login,
        password_hash,
        created_at: Utc::now(),
    };

    let mut conn = match state.db.acquire().await {
        Ok(conn) => conn,
        Err(err) => {
            metrics::auth_register("db_error");
            tracing::error!(
                event = "auth_register_failed",
                reason = "db_error",
                error = %err,
                "Registration failed"
            );
            return Err(AuthError::Db);
        }
    };
    match UserRepo::new(&mut conn).create(&user).await {
        Ok(true) => {}
        Ok(false) => {
            metrics::auth_register("rejected");
            tracing::warn!(
                event = "auth_register_rejected",
                reason = "login_taken",
                "Registration rejected"
            );
            return Err(AuthError::AlreadyExists("login_taken"));
        }
        Err(err) => {
            metrics::auth_register("db_error");
            tracing::error!(
                event = "auth_register_failed",
                reason = "db_error",
                error = %err,
                "Registration failed"
            );
            return Err(AuthError::Db);
        }
    }

    metrics::auth_register("ok");
    tracing::info!(event = "user_registered", user_id = %user.id, "User registered");
    Ok(RegisterResponse { user_id: user.id })
}

pub async fn login(state: &AppState, payload: &LoginRequest) -> Result<LoginResponse, AuthError> {
    let login = payload.login.trim();
    if login.is_empty() || payload.password.is_empty() {
        metrics::auth_login("rejected");
        return Err(AuthError::InvalidCredentials);
    }

    let mut conn = state.db.acquire().await.map_err(|err| {
        metrics::auth_login("db_error");
        tracing::error!(event = "auth_login_failed", reason = "db_error", error = %err);
        AuthError::Db
    })?;
    let user = UserRepo::new(&mut conn)
        .get_by_login(login)
        .await
        .map_err(|err| {
            metrics::auth_login("db_error");
            tracing::error!(event = "auth_login_failed", reason = "db_error", error = %err);
            AuthError::Db
        })?;
    drop(conn);

    let Some(user) = user else {
        metrics::auth_login("rejected");
        tracing::warn!(event = "auth_login_rejected", reason = "unknown_login");
        return Err(AuthError::InvalidCredentials);
    };
    if !verify_password(state, user.password_hash.clone(), payload.password.clone()).await? {
        metrics::auth_login("rejected");
        tracing::warn!(
            event = "auth_login_rejected",
            reason = "bad_password",
            user_id = %user.id
        );
        return Err(AuthError::InvalidCredentials);
    }

    let (access_token, expires_at) = state
        .tokens
        .issue(user.id, &user.login, Utc::now())
        .map_err(|err| {
            metrics::auth_login("error");
            tracing::error!(event = "auth_login_failed", reason = %err, user_id = %user.id);
            AuthError::Internal("token_issue_failed")
        })?;

    metrics::auth_login("ok");
    tracing::info!(event = "user_logged_in", user_id = %user.id, "Login succeeded");
    Ok(LoginResponse {
        access_token,
        expires_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_collect_every_violation() {
        let errors = validate_credentials("   ", "short").expect_err("invalid");
        assert_eq!(errors.codes(), &["login_required", "password_too_short"]);
    }

    #[test]
    fn login_is_trimmed() {
        let login = validate_credentials("  alice ", "long-enough-password").expect("valid");
        assert_eq!(login, "alice");
    }

    #[test]
    fn overlong_login_is_rejected() {
        let login = "a".repeat(MAX_LOGIN_LEN + 1);
        let errors = validate_credentials(&login, "long-enough-password").expect_err("invalid");
        assert!(errors.contains("login_too_long"));
    }
}
