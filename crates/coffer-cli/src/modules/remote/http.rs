use std::sync::Arc;

use async_trait::async_trait;
use coffer_core::api::auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse};
use coffer_core::api::entries::{
    CreateEntryRequest, EntriesDiffRequest, EntriesDiffResponse, EntryRef, UpdateEntryRequest,
};
use coffer_core::api::ErrorResponse;
use coffer_core::services::{ApiError, EntriesApi};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use crate::modules::auth::TokenCache;

/// Entry RPCs over the server's HTTP/JSON API.
pub struct HttpRemote {
    client: reqwest::Client,
    addr: String,
    tokens: Arc<TokenCache>,
}

impl HttpRemote {
    pub fn new(client: reqwest::Client, addr: &str, tokens: Arc<TokenCache>) -> Self {
        Self {
            client,
            addr: addr.trim_end_matches('/').to_string(),
            tokens,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.addr)
    }

    async fn authorized(&self, method: Method, path: &str) -> Result<RequestBuilder, ApiError> {
        let token = self.tokens.get().await.ok_or(ApiError::Unauthenticated)?;
        Ok(self.client.request(method, self.url(path)).bearer_auth(token))
    }

    pub async fn register(&self, login: &str, password: &str) -> Result<RegisterResponse, ApiError> {
        let body = RegisterRequest {
            login: login.to_string(),
            password: password.to_string(),
        };
        let request = self.client.post(self.url("/v1/auth/register"));
        send_json(request, "register", Some(&body)).await
    }

    /// Exchanges credentials for an access token. The caller decides whether
    /// to cache it.
    pub async fn login(&self, login: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest {
            login: login.to_string(),
            password: password.to_string(),
        };
        let request = self.client.post(self.url("/v1/auth/login"));
        send_json(request, "login", Some(&body)).await
    }
}

#[async_trait]
impl EntriesApi for HttpRemote {
    async fn create_entry(&self, request: &CreateEntryRequest) -> Result<EntryRef, ApiError> {
        let builder = self.authorized(Method::POST, "/v1/entries").await?;
        send_json(builder, "create_entry", Some(request)).await
    }

    async fn update_entry(
        &self,
        id: Uuid,
        request: &UpdateEntryRequest,
    ) -> Result<EntryRef, ApiError> {
        let builder = self
            .authorized(Method::PUT, &format!("/v1/entries/{id}"))
            .await?;
        send_json(builder, "update_entry", Some(request)).await
    }

    async fn delete_entry(&self, id: Uuid) -> Result<EntryRef, ApiError> {
        let builder = self
            .authorized(Method::DELETE, &format!("/v1/entries/{id}"))
            .await?;
        send_json::<(), _>(builder, "delete_entry", None).await
    }

    async fn get_entries_diff(
        &self,
        request: &EntriesDiffRequest,
    ) -> Result<EntriesDiffResponse, ApiError> {
        let builder = self.authorized(Method::POST, "/v1/entries/diff").await?;
        send_json(builder, "get_entries_diff", Some(request)).await
    }
}

async fn send_json<B: Serialize + ?Sized, T: DeserializeOwned>(
    request: RequestBuilder,
    op: &'static str,
    body: Option<&B>,
) -> Result<T, ApiError> {
    let request = match body {
        Some(body) => request.json(body),
        None => request,
    };
    let response = request.send().await.map_err(transport_error)?;
    debug!(event = "remote_response", op, status = %response.status());
    decode(response).await
}

fn transport_error(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Transport("request timed out".to_string())
    } else {
        ApiError::Transport(err.to_string())
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    if status.is_success() {
        return response.json::<T>().await.map_err(transport_error);
    }
    let body = response.text().await.unwrap_or_default();
    let error = serde_json::from_str::<ErrorResponse>(&body).ok();
    Err(match status {
        StatusCode::BAD_REQUEST => {
            ApiError::Invalid(error.map(|error| error.details).unwrap_or_default())
        }
        StatusCode::UNAUTHORIZED => ApiError::Unauthenticated,
        StatusCode::NOT_FOUND => ApiError::NotFound,
        StatusCode::CONFLICT => ApiError::AlreadyExists,
        _ => ApiError::Internal(
            error
                .map(|error| error.error)
                .unwrap_or_else(|| status.to_string()),
        ),
    })
}
