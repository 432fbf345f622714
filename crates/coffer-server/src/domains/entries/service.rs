use std::future::Future;
use std::time::Duration;

use chrono::Utc;
use coffer_core::api::entries::{
    CreateEntryRequest, EntriesDiffRequest, EntriesDiffResponse, EntryDto, EntryRef,
    UpdateEntryRequest,
};
use coffer_core::{get_diff, EntriesDiff, Entry, EntryChange, Identity, NewEntry, ValidationErrors};
use coffer_db::repo::EntryRepo;
use thiserror::Error;
use uuid::Uuid;

use crate::app::AppState;
use crate::domains::entries::conflict::{conflict_key, plan_update, UpdatePlan};
use crate::infra::{db, metrics};

#[derive(Debug, Error)]
pub enum EntriesError {
    #[error("invalid_argument: {0}")]
    Invalid(ValidationErrors),
    #[error("not_found")]
    NotFound,
    #[error("db_error")]
    Db,
    #[error("internal: {0}")]
    Internal(&'static str),
}

impl From<ValidationErrors> for EntriesError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Invalid(errors)
    }
}

/// Failure of one transaction attempt. Only `Db` errors are candidates for a rerun.
enum TxError {
    Db(sqlx_core::Error),
    Rejected(EntriesError),
}

impl From<sqlx_core::Error> for TxError {
    fn from(err: sqlx_core::Error) -> Self {
        Self::Db(err)
    }
}

fn db_failure(op: &'static str, user_id: Uuid, err: &sqlx_core::Error) -> EntriesError {
    metrics::entry_operation(op, "db_error");
    tracing::error!(
        event = "entry_operation_failed",
        op,
        reason = "db_error",
        user_id = %user_id,
        error = %err,
        "Entry operation failed"
    );
    EntriesError::Db
}

fn internal_failure(op: &'static str, user_id: Uuid, reason: &'static str) -> EntriesError {
    metrics::entry_operation(op, "error");
    tracing::error!(
        event = "entry_operation_failed",
        op,
        reason,
        user_id = %user_id,
        "Entry operation failed"
    );
    EntriesError::Internal(reason)
}

fn rejected(op: &'static str, error: EntriesError) -> EntriesError {
    let result = match &error {
        EntriesError::Invalid(_) => "invalid",
        EntriesError::NotFound => "not_found",
        EntriesError::Db | EntriesError::Internal(_) => "error",
    };
    metrics::entry_operation(op, result);
    error
}

/// Reruns `attempt` while Postgres reports a serialization failure or deadlock.
async fn run_with_retry<T, F, Fut>(
    op: &'static str,
    user_id: Uuid,
    mut attempt: F,
) -> Result<T, EntriesError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TxError>>,
{
    let mut tries = 1;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(TxError::Db(err))
                if tries < db::MAX_TX_ATTEMPTS && db::is_serialization_failure(&err) =>
            {
                tracing::debug!(
                    event = "entry_tx_retry",
                    op,
                    user_id = %user_id,
                    attempt = tries,
                    error = %err,
                    "Transaction lost a race; retrying"
                );
                tokio::time::sleep(Duration::from_millis(u64::from(tries) * 5)).await;
                tries += 1;
            }
            Err(TxError::Db(err)) => return Err(db_failure(op, user_id, &err)),
            Err(TxError::Rejected(error)) => return Err(error),
        }
    }
}

fn decrypt_entry(state: &AppState, entry: Entry) -> Result<EntryDto, &'static str> {
    let data = state
        .cipher
        .decrypt(&entry.data_enc)
        .map_err(|_| "decryption_failed")?;
    Ok(EntryDto {
        id: entry.id,
        key: entry.key,
        entry_type: entry.entry_type,
        meta: entry.meta,
        data,
        version: entry.version,
        created_at: entry.created_at,
        updated_at: entry.updated_at,
    })
}

pub async fn create_entry(
    state: &AppState,
    identity: &Identity,
    request: CreateEntryRequest,
) -> Result<EntryRef, EntriesError> {
    create_entry_with_id(state, identity, request, Uuid::now_v7()).await
}

/// Creates an entry under a caller-chosen id. An id that is already taken
/// does not fail the call: the write is forked onto a fresh id and a
/// conflict-marked key inside the same transaction.
pub async fn create_entry_with_id(
    state: &AppState,
    identity: &Identity,
    request: CreateEntryRequest,
    id: Uuid,
) -> Result<EntryRef, EntriesError> {
    const OP: &str = "create";
    let user_id = identity.user_id;
    let command = NewEntry::validate(
        user_id,
        &request.key,
        &request.entry_type,
        request.meta,
        request.data,
    )
    .map_err(|errors| rejected(OP, errors.into()))?;
    let data_enc = state
        .cipher
        .encrypt(&command.data)
        .map_err(|_| internal_failure(OP, user_id, "encryption_failed"))?;

    let now = Utc::now();
    let entry = Entry {
        id,
        user_id,
        key: command.key,
        entry_type: command.entry_type,
        meta: command.meta,
        data_enc,
        version: 1,
        created_at: now,
        updated_at: now,
    };

    let template = &entry;
    let stored = run_with_retry(OP, user_id, move || {
        try_create(state, OP, template.clone())
    })
    .await?;

    if stored.id != id {
        metrics::entry_conflict(OP);
        tracing::warn!(
            event = "entry_create_conflict",
            user_id = %user_id,
            entry_id = %id,
            fork_id = %stored.id,
            "Create collided; forked to a conflict entry"
        );
    }
    metrics::entry_operation(OP, "ok");
    tracing::info!(
        event = "entry_created",
        user_id = %user_id,
        entry_id = %stored.id,
        entry_type = %stored.entry_type,
        "Entry created"
    );
    Ok(EntryRef {
        id: stored.id,
        version: stored.version,
        key: Some(stored.key),
    })
}

async fn try_create(
    state: &AppState,
    op: &'static str,
    mut entry: Entry,
) -> Result<Entry, TxError> {
    let mut uow = db::begin(&state.db, state.db_tx_isolation, "entries.create").await?;
    {
        let mut repo = EntryRepo::new(uow.conn());
        if !repo.insert_if_absent(&entry).await? {
            entry.id = Uuid::now_v7();
            entry.key = conflict_key(&entry.key, entry.version);
            if !repo.insert_if_absent(&entry).await? {
                return Err(TxError::Rejected(internal_failure(
                    op,
                    entry.user_id,
                    "conflict_fork_failed",
                )));
            }
        }
    }
    uow.commit().await?;
    Ok(entry)
}

pub async fn get_entry(
    state: &AppState,
    identity: &Identity,
    id: Uuid,
) -> Result<EntryDto, EntriesError> {
    const OP: &str = "get";
    let user_id = identity.user_id;
    let mut conn = state
        .db
        .acquire()
        .await
        .map_err(|err| db_failure(OP, user_id, &err))?;
    let entry = EntryRepo::new(&mut conn)
        .get(user_id, id)
        .await
        .map_err(|err| db_failure(OP, user_id, &err))?
        .ok_or_else(|| rejected(OP, EntriesError::NotFound))?;
    let dto = decrypt_entry(state, entry).map_err(|reason| internal_failure(OP, user_id, reason))?;
    metrics::entry_operation(OP, "ok");
    Ok(dto)
}

/// What a committed update did to the stored rows.
enum UpdateOutcome {
    Updated(EntryRef),
    Forked {
        original: EntryRef,
        fork: EntryRef,
    },
}

/// Applies an edit guarded by `request.version`.
///
/// A stale version never touches the stored row; the edit is written to a new
/// entry instead and that entry's id and version are returned. Racing updates
/// with the same expected version resolve to one in-place write and forks for
/// the rest.
pub async fn update_entry(
    state: &AppState,
    identity: &Identity,
    id: Uuid,
    request: UpdateEntryRequest,
) -> Result<EntryRef, EntriesError> {
    const OP: &str = "update";
    let user_id = identity.user_id;
    let change = EntryChange::validate(id, user_id, request.version, request.meta, request.data)
        .map_err(|errors| rejected(OP, errors.into()))?;
    let data_enc = state
        .cipher
        .encrypt(&change.data)
        .map_err(|_| internal_failure(OP, user_id, "encryption_failed"))?;

    let change = &change;
    let data_enc = data_enc.as_slice();
    let outcome = run_with_retry(OP, user_id, move || {
        try_update(state, OP, change, data_enc)
    })
    .await?;

    metrics::entry_operation(OP, "ok");
    match outcome {
        UpdateOutcome::Updated(updated) => {
            tracing::info!(
                event = "entry_updated",
                user_id = %user_id,
                entry_id = %updated.id,
                version = updated.version,
                "Entry updated"
            );
            Ok(updated)
        }
        UpdateOutcome::Forked { original, fork } => {
            metrics::entry_conflict(OP);
            tracing::warn!(
                event = "entry_update_conflict",
                user_id = %user_id,
                entry_id = %original.id,
                expected_version = change.expected_version,
                current_version = original.version,
                fork_id = %fork.id,
                "Stale update forked to a conflict entry"
            );
            Ok(fork)
        }
    }
}

async fn try_update(
    state: &AppState,
    op: &'static str,
    change: &EntryChange,
    data_enc: &[u8],
) -> Result<UpdateOutcome, TxError> {
    let user_id = change.user_id;
    let mut uow = db::begin(&state.db, state.db_tx_isolation, "entries.update").await?;
    let outcome = {
        let mut repo = EntryRepo::new(uow.conn());
        let current = repo
            .get_for_update(user_id, change.id)
            .await?
            .ok_or_else(|| TxError::Rejected(rejected(op, EntriesError::NotFound)))?;

        let now = Utc::now();
        match plan_update(
            current.version,
            change.expected_version,
            current.updated_at,
            now,
        ) {
            UpdatePlan::InPlace {
                version,
                updated_at,
            } => {
                let updated = Entry {
                    meta: change.meta.clone(),
                    data_enc: data_enc.to_vec(),
                    version,
                    updated_at,
                    ..current
                };
                let rows = repo.update(&updated, change.expected_version).await?;
                if rows != 1 {
                    return Err(TxError::Rejected(internal_failure(
                        op,
                        user_id,
                        "update_lost",
                    )));
                }
                UpdateOutcome::Updated(EntryRef {
                    id: updated.id,
                    version: updated.version,
                    key: Some(updated.key),
                })
            }
            UpdatePlan::Fork => {
                let fork = Entry {
                    id: Uuid::now_v7(),
                    user_id,
                    key: conflict_key(&current.key, change.expected_version),
                    entry_type: current.entry_type,
                    meta: change.meta.clone(),
                    data_enc: data_enc.to_vec(),
                    version: 1,
                    created_at: now,
                    updated_at: now,
                };
                if !repo.insert_if_absent(&fork).await? {
                    return Err(TxError::Rejected(internal_failure(
                        op,
                        user_id,
                        "conflict_fork_failed",
                    )));
                }
                UpdateOutcome::Forked {
                    original: EntryRef {
                        id: current.id,
                        version: current.version,
                        key: None,
                    },
                    fork: EntryRef {
                        id: fork.id,
                        version: fork.version,
                        key: Some(fork.key),
                    },
                }
            }
        }
    };
    uow.commit().await?;
    Ok(outcome)
}

pub async fn delete_entry(
    state: &AppState,
    identity: &Identity,
    id: Uuid,
) -> Result<EntryRef, EntriesError> {
    const OP: &str = "delete";
    let user_id = identity.user_id;
    let version = run_with_retry(OP, user_id, move || try_delete(state, OP, user_id, id)).await?;

    metrics::entry_operation(OP, "ok");
    tracing::info!(
        event = "entry_deleted",
        user_id = %user_id,
        entry_id = %id,
        version,
        "Entry deleted"
    );
    Ok(EntryRef {
        id,
        version,
        key: None,
    })
}

async fn try_delete(
    state: &AppState,
    op: &'static str,
    user_id: Uuid,
    id: Uuid,
) -> Result<i64, TxError> {
    let mut uow = db::begin(&state.db, state.db_tx_isolation, "entries.delete").await?;
    let version = {
        let mut repo = EntryRepo::new(uow.conn());
        let current = repo
            .get_for_update(user_id, id)
            .await?
            .ok_or_else(|| TxError::Rejected(rejected(op, EntriesError::NotFound)))?;
        if repo.delete(user_id, id).await? == 0 {
            return Err(TxError::Rejected(rejected(op, EntriesError::NotFound)));
        }
        current.version
    };
    uow.commit().await?;
    Ok(version)
}

/// Diffs the caller's version map against the server and returns the records
/// the caller is missing, all read from one snapshot.
pub async fn get_entries_diff(
    state: &AppState,
    identity: &Identity,
    request: &EntriesDiffRequest,
) -> Result<EntriesDiffResponse, EntriesError> {
    const OP: &str = "diff";
    let user_id = identity.user_id;
    let client_versions = request.versions();

    let versions = client_versions.as_slice();
    let (diff, rows) = run_with_retry(OP, user_id, move || {
        try_diff(state, user_id, versions)
    })
    .await?;

    let entries = rows
        .into_iter()
        .map(|entry| decrypt_entry(state, entry))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|reason| internal_failure(OP, user_id, reason))?;

    metrics::entry_operation(OP, "ok");
    metrics::sync_diff_entries(entries.len());
    tracing::debug!(
        event = "entries_diff",
        user_id = %user_id,
        client_entries = client_versions.len(),
        creates = diff.create_ids.len(),
        updates = diff.update_ids.len(),
        deletes = diff.delete_ids.len(),
        "Entries diff computed"
    );
    Ok(EntriesDiffResponse {
        create_ids: diff.create_ids,
        update_ids: diff.update_ids,
        delete_ids: diff.delete_ids,
        entries,
    })
}

async fn try_diff(
    state: &AppState,
    user_id: Uuid,
    client_versions: &[coffer_core::EntryVersion],
) -> Result<(EntriesDiff, Vec<Entry>), TxError> {
    let mut uow = db::begin(&state.db, state.db_tx_isolation, "entries.diff").await?;
    let (diff, rows) = {
        let mut repo = EntryRepo::new(uow.conn());
        let server_versions = repo.list_versions(user_id).await?;
        let diff = get_diff(&server_versions, client_versions);
        let rows = repo.get_by_ids(user_id, &diff.fetch_ids()).await?;
        (diff, rows)
    };
    uow.commit().await?;
    Ok((diff, rows))
}
