use std::sync::Arc;

use chrono::{DateTime, Utc};
use coffer_core::{check_data, check_key, EntryData, EntryType, Meta, ValidationErrors};
use coffer_crypto::Cipher;
use coffer_db::local::{LocalEntry, LocalEntryRepo};
use coffer_db::{SqlitePool, UnitOfWork};
use uuid::Uuid;

use crate::modules::system::ClientError;

/// Decrypted view of one local entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultEntry {
    pub id: Uuid,
    pub key: String,
    pub meta: Meta,
    pub data: EntryData,
    pub version: i64,
    pub global_version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing row; the payload stays sealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntrySummary {
    pub id: Uuid,
    pub key: String,
    pub entry_type: EntryType,
    pub version: i64,
    pub global_version: i64,
    pub pending: bool,
}

/// Offline entry operations on the local store.
///
/// Edits bump the local `version` only; `global_version` belongs to sync.
#[derive(Clone)]
pub struct LocalVault {
    pool: SqlitePool,
    cipher: Arc<Cipher>,
}

impl LocalVault {
    pub fn new(pool: SqlitePool, cipher: Arc<Cipher>) -> Self {
        Self { pool, cipher }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub(crate) fn seal(&self, plaintext: &[u8]) -> Result<Vec<u8>, ClientError> {
        Ok(self.cipher.encrypt(plaintext)?)
    }

    pub(crate) fn open(&self, ciphertext: &[u8]) -> Result<Vec<u8>, ClientError> {
        Ok(self.cipher.decrypt(ciphertext)?)
    }

    pub async fn create(
        &self,
        key: &str,
        meta: Meta,
        data: &EntryData,
    ) -> Result<EntrySummary, ClientError> {
        let bytes = data.to_bytes()?;
        let mut errors = ValidationErrors::new();
        check_key(&mut errors, key);
        check_data(&mut errors, &bytes);
        errors.into_result()?;

        let now = Utc::now();
        let entry = LocalEntry {
            id: Uuid::now_v7(),
            key: key.trim().to_string(),
            entry_type: data.entry_type(),
            meta,
            data_enc: self.seal(&bytes)?,
            version: 1,
            global_version: 0,
            created_at: now,
            updated_at: now,
        };
        let mut conn = self.pool.acquire().await?;
        LocalEntryRepo::new(&mut conn).insert(&entry).await?;
        tracing::info!(
            event = "local_entry_created",
            entry_id = %entry.id,
            entry_type = %entry.entry_type
        );
        Ok(summary(&entry))
    }

    /// Replaces payload (and meta, when given). The entry type is fixed at creation.
    pub async fn update(
        &self,
        id: Uuid,
        meta: Option<Meta>,
        data: &EntryData,
    ) -> Result<EntrySummary, ClientError> {
        let bytes = data.to_bytes()?;
        let mut errors = ValidationErrors::new();
        check_data(&mut errors, &bytes);
        errors.into_result()?;
        let data_enc = self.seal(&bytes)?;

        let mut uow = UnitOfWork::begin(&self.pool, "local.update").await?;
        let updated = {
            let mut repo = LocalEntryRepo::new(uow.conn());
            let current = repo.get(id).await?.ok_or(ClientError::NotFound)?;
            if current.entry_type != data.entry_type() {
                return Err(ClientError::invalid("type_immutable"));
            }
            let updated = LocalEntry {
                meta: meta.unwrap_or_else(|| current.meta.clone()),
                data_enc,
                version: current.version + 1,
                updated_at: Utc::now().max(current.updated_at),
                ..current
            };
            if repo.update_local(&updated).await? != 1 {
                return Err(ClientError::NotFound);
            }
            updated
        };
        uow.commit().await?;
        tracing::info!(
            event = "local_entry_updated",
            entry_id = %updated.id,
            version = updated.version
        );
        Ok(summary(&updated))
    }

    /// Removes the row. Ids the server already knows stay in the sync ledger
    /// until the delete is pushed.
    pub async fn delete(&self, id: Uuid) -> Result<(), ClientError> {
        let mut conn = self.pool.acquire().await?;
        if LocalEntryRepo::new(&mut conn).delete(id).await? == 0 {
            return Err(ClientError::NotFound);
        }
        tracing::info!(event = "local_entry_deleted", entry_id = %id);
        Ok(())
    }

    pub async fn get(&self, id: Uuid) -> Result<VaultEntry, ClientError> {
        let mut conn = self.pool.acquire().await?;
        let entry = LocalEntryRepo::new(&mut conn)
            .get(id)
            .await?
            .ok_or(ClientError::NotFound)?;
        let bytes = self.open(&entry.data_enc)?;
        Ok(VaultEntry {
            id: entry.id,
            key: entry.key,
            meta: entry.meta,
            data: EntryData::from_bytes(entry.entry_type, &bytes)?,
            version: entry.version,
            global_version: entry.global_version,
            created_at: entry.created_at,
            updated_at: entry.updated_at,
        })
    }

    pub async fn list(&self) -> Result<Vec<EntrySummary>, ClientError> {
        let mut conn = self.pool.acquire().await?;
        let entries = LocalEntryRepo::new(&mut conn).list().await?;
        Ok(entries.iter().map(summary).collect())
    }
}

fn summary(entry: &LocalEntry) -> EntrySummary {
    EntrySummary {
        id: entry.id,
        key: entry.key.clone(),
        entry_type: entry.entry_type,
        version: entry.version,
        global_version: entry.global_version,
        pending: entry.is_dirty(),
    }
}
