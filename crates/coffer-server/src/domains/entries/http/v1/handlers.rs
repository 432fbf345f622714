use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use coffer_core::api::entries::{CreateEntryRequest, EntriesDiffRequest, UpdateEntryRequest};
use coffer_core::{Identity, ValidationErrors};
use uuid::Uuid;

use crate::app::AppState;
use crate::domains::entries::service::{self, EntriesError};
use crate::domains::errors;

fn map_entries_error(error: EntriesError) -> axum::response::Response {
    match error {
        EntriesError::Invalid(violations) => errors::invalid_argument(&violations),
        EntriesError::NotFound => errors::not_found(),
        EntriesError::Db | EntriesError::Internal(_) => errors::internal(),
    }
}

fn parse_entry_id(value: &str) -> Result<Uuid, axum::response::Response> {
    Uuid::parse_str(value)
        .map_err(|_| errors::invalid_argument(&ValidationErrors::from("id_invalid")))
}

pub(super) async fn create_entry(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<CreateEntryRequest>,
) -> impl IntoResponse {
    match service::create_entry(&state, &identity, payload).await {
        Ok(entry) => (StatusCode::CREATED, Json(entry)).into_response(),
        Err(err) => map_entries_error(err),
    }
}

pub(super) async fn get_entry(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(entry_id): Path<String>,
) -> impl IntoResponse {
    let entry_id = match parse_entry_id(&entry_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service::get_entry(&state, &identity, entry_id).await {
        Ok(entry) => (StatusCode::OK, Json(entry)).into_response(),
        Err(err) => map_entries_error(err),
    }
}

pub(super) async fn update_entry(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(entry_id): Path<String>,
    Json(payload): Json<UpdateEntryRequest>,
) -> impl IntoResponse {
    let entry_id = match parse_entry_id(&entry_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service::update_entry(&state, &identity, entry_id, payload).await {
        Ok(entry) => (StatusCode::OK, Json(entry)).into_response(),
        Err(err) => map_entries_error(err),
    }
}

pub(super) async fn delete_entry(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(entry_id): Path<String>,
) -> impl IntoResponse {
    let entry_id = match parse_entry_id(&entry_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    match service::delete_entry(&state, &identity, entry_id).await {
        Ok(entry) => (StatusCode::OK, Json(entry)).into_response(),
        Err(err) => map_entries_error(err),
    }
}

pub(super) async fn get_entries_diff(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(payload): Json<EntriesDiffRequest>,
) -> impl IntoResponse {
    match service::get_entries_diff(&state, &identity, &payload).await {
        Ok(diff) => (StatusCode::OK, Json(diff)).into_response(),
        Err(err) => map_entries_error(err),
    }
}
