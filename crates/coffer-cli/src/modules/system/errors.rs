use coffer_core::services::ApiError;
use coffer_core::{PayloadError, ValidationErrors};
use coffer_crypto::CryptoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid argument: {}", .0.join(", "))]
    Invalid(Vec<String>),
    #[error("not found")]
    NotFound,
    #[error("unauthenticated")]
    Unauthenticated,
    #[error("sync in progress")]
    SyncInProgress,
    #[error("timed out")]
    Timeout,
    #[error("remote: {0}")]
    Remote(String),
    #[error("storage: {0}")]
    Storage(#[from] sqlx_core::Error),
    #[error("crypto: {0}")]
    Crypto(#[from] CryptoError),
}

impl ClientError {
    pub fn invalid(code: &str) -> Self {
        Self::Invalid(vec![code.to_string()])
    }

    /// One-line text shown to the user for this failure category.
    pub fn status_message(&self) -> String {
        match self {
            Self::Invalid(details) if details.is_empty() => "invalid input".to_string(),
            Self::Invalid(details) => format!("invalid input: {}", details.join(", ")),
            Self::NotFound => "entry not found".to_string(),
            Self::Unauthenticated => "not logged in (run `coffer login`)".to_string(),
            Self::SyncInProgress => "sync already in progress".to_string(),
            Self::Timeout => "operation timed out".to_string(),
            Self::Remote(message) => format!("server error: {message}"),
            Self::Storage(_) => "local storage failure".to_string(),
            Self::Crypto(_) => "local encryption failure".to_string(),
        }
    }
}

impl From<ApiError> for ClientError {
    fn from(error: ApiError) -> Self {
        match error {
            ApiError::Invalid(details) => Self::Invalid(details),
            ApiError::NotFound => Self::NotFound,
            ApiError::Unauthenticated => Self::Unauthenticated,
            ApiError::AlreadyExists => Self::Remote("already exists".to_string()),
            ApiError::Internal(message) | ApiError::Transport(message) => Self::Remote(message),
        }
    }
}

impl From<ValidationErrors> for ClientError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Invalid(errors.codes().iter().map(|code| (*code).to_string()).collect())
    }
}

impl From<PayloadError> for ClientError {
    fn from(_: PayloadError) -> Self {
        Self::invalid("payload_invalid")
    }
}
