use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::api::entries::{
    CreateEntryRequest, EntriesDiffRequest, EntriesDiffResponse, EntryRef, UpdateEntryRequest,
};

/// Failure categories of the entries RPC surface, as seen by a caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Invalid(Vec<String>),
    NotFound,
    Unauthenticated,
    AlreadyExists,
    Internal(String),
    Transport(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Invalid(details) => write!(f, "invalid argument: {}", details.join(", ")),
            Self::NotFound => write!(f, "not found"),
            Self::Unauthenticated => write!(f, "unauthenticated"),
            Self::AlreadyExists => write!(f, "already exists"),
            Self::Internal(message) => write!(f, "internal error: {message}"),
            Self::Transport(message) => write!(f, "transport error: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Remote entry operations consumed by the client sync engine.
#[async_trait]
pub trait EntriesApi: Send + Sync {
    async fn create_entry(&self, request: &CreateEntryRequest) -> Result<EntryRef, ApiError>;

    async fn update_entry(
        &self,
        id: Uuid,
        request: &UpdateEntryRequest,
    ) -> Result<EntryRef, ApiError>;

    async fn delete_entry(&self, id: Uuid) -> Result<EntryRef, ApiError>;

    async fn get_entries_diff(
        &self,
        request: &EntriesDiffRequest,
    ) -> Result<EntriesDiffResponse, ApiError>;
}

#[async_trait]
impl<T: EntriesApi + ?Sized> EntriesApi for Arc<T> {
    async fn create_entry(&self, request: &CreateEntryRequest) -> Result<EntryRef, ApiError> {
        (**self).create_entry(request).await
    }

    async fn update_entry(
        &self,
        id: Uuid,
        request: &UpdateEntryRequest,
    ) -> Result<EntryRef, ApiError> {
        (**self).update_entry(id, request).await
    }

    async fn delete_entry(&self, id: Uuid) -> Result<EntryRef, ApiError> {
        (**self).delete_entry(id).await
    }

    async fn get_entries_diff(
        &self,
        request: &EntriesDiffRequest,
    ) -> Result<EntriesDiffResponse, ApiError> {
        (**self).get_entries_diff(request).await
    }
}
