use std::collections::HashSet;
use std::time::Duration;

use coffer_core::api::entries::{CreateEntryRequest, EntriesDiffRequest, UpdateEntryRequest};
use coffer_core::services::{ApiError, EntriesApi};
use coffer_db::local::{LocalEntry, LocalEntryRepo, SyncLedgerRepo};
use coffer_db::UnitOfWork;
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

use crate::modules::entries::LocalVault;
use crate::modules::system::ClientError;

/// Counts of what one sync pushed and pulled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub pushed_creates: usize,
    pub pushed_updates: usize,
    pub pushed_deletes: usize,
    pub forked: usize,
    pub created: usize,
    pub updated: usize,
    pub deleted: usize,
}

impl SyncReport {
    pub fn local_changes(&self) -> usize {
        self.created + self.updated + self.deleted
    }
}

impl std::fmt::Display for SyncReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "pushed: {} created, {} updated, {} deleted ({} forked); pulled: {} created, {} updated, {} deleted",
            self.pushed_creates,
            self.pushed_updates,
            self.pushed_deletes,
            self.forked,
            self.created,
            self.updated,
            self.deleted
        )
    }
}

/// Drives push-then-pull synchronization of the local vault against a remote.
///
/// Only one sync runs per engine; a second caller gets
/// [`ClientError::SyncInProgress`] instead of waiting.
pub struct SyncEngine<A> {
    vault: LocalVault,
    remote: A,
    timeout: Duration,
    running: Mutex<()>,
}

impl<A: EntriesApi> SyncEngine<A> {
    pub fn new(vault: LocalVault, remote: A, timeout: Duration) -> Self {
        Self {
            vault,
            remote,
            timeout,
            running: Mutex::new(()),
        }
    }

    pub async fn sync(&self) -> Result<SyncReport, ClientError> {
        let Ok(_running) = self.running.try_lock() else {
            warn!(event = "sync_rejected", reason = "in_progress");
            return Err(ClientError::SyncInProgress);
        };
        // Expiry drops the in-flight future, which rolls back any open local transaction.
        let Ok(result) = tokio::time::timeout(self.timeout, self.run()).await else {
            warn!(
                event = "sync_timeout",
                timeout_ms = self.timeout.as_millis() as u64
            );
            return Err(ClientError::Timeout);
        };
        match &result {
            Ok(report) => info!(
                event = "sync_completed",
                pushed_creates = report.pushed_creates,
                pushed_updates = report.pushed_updates,
                pushed_deletes = report.pushed_deletes,
                forked = report.forked,
                created = report.created,
                updated = report.updated,
                deleted = report.deleted,
                "Sync completed"
            ),
            Err(err) => warn!(event = "sync_failed", error = %err, "Sync failed"),
        }
        result
    }

    async fn run(&self) -> Result<SyncReport, ClientError> {
        let mut report = SyncReport::default();
        self.push_deletes(&mut report).await?;
        self.push_edits(&mut report).await?;
        self.pull(&mut report).await?;
        Ok(report)
    }

    async fn push_deletes(&self, report: &mut SyncReport) -> Result<(), ClientError> {
        let orphaned = {
            let mut conn = self.vault.pool().acquire().await?;
            SyncLedgerRepo::new(&mut conn).list_orphaned().await?
        };
        for ledger in orphaned {
            match self.remote.delete_entry(ledger.id).await {
                Ok(_) | Err(ApiError::NotFound) => {}
                Err(err) => return Err(err.into()),
            }
            let mut conn = self.vault.pool().acquire().await?;
            SyncLedgerRepo::new(&mut conn).remove(ledger.id).await?;
            report.pushed_deletes += 1;
        }
        Ok(())
    }

    async fn push_edits(&self, report: &mut SyncReport) -> Result<(), ClientError> {
        let pending = {
            let mut conn = self.vault.pool().acquire().await?;
            LocalEntryRepo::new(&mut conn).list_pending().await?
        };
        for entry in pending {
            let data = self.vault.open(&entry.data_enc)?;
            if entry.is_new() {
                self.push_create(&entry, data, report).await?;
                continue;
            }
            let request = UpdateEntryRequest {
                meta: entry.meta.clone(),
                data: data.clone(),
                version: entry.global_version,
            };
            match self.remote.update_entry(entry.id, &request).await {
                Ok(result) if result.id == entry.id => {
                    let mut conn = self.vault.pool().acquire().await?;
                    LocalEntryRepo::new(&mut conn)
                        .mark_pushed(entry.id, entry.version, result.version)
                        .await?;
                    report.pushed_updates += 1;
                }
                Ok(result) => {
                    // The server kept its copy and stored ours as a fork. Marking
                    // the row clean lets the pull overwrite it and fetch the fork.
                    let mut conn = self.vault.pool().acquire().await?;
                    LocalEntryRepo::new(&mut conn)
                        .mark_pushed(entry.id, entry.version, entry.global_version)
                        .await?;
                    report.forked += 1;
                    warn!(
                        event = "sync_update_forked",
                        entry_id = %entry.id,
                        fork_id = %result.id,
                        "Local edit lost a version race and was forked"
                    );
                }
                Err(ApiError::NotFound) => {
                    warn!(
                        event = "sync_update_recreated",
                        entry_id = %entry.id,
                        "Entry was deleted remotely; pushing local edit as a new entry"
                    );
                    self.push_create(&entry, data, report).await?;
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(())
    }

    /// Pushes a never-synced row and rebinds it to the server id.
    ///
    /// Not idempotent: if the deadline fires after the server accepted the
    /// create but before the rebind commits, the row stays pending under its
    /// local id and the next sync creates it again. The server keeps the
    /// first copy as an orphan that pull then brings down as a separate entry.
    async fn push_create(
        &self,
        entry: &LocalEntry,
        data: Vec<u8>,
        report: &mut SyncReport,
    ) -> Result<(), ClientError> {
        let request = CreateEntryRequest {
            key: entry.key.clone(),
            entry_type: entry.entry_type.as_str().to_string(),
            meta: entry.meta.clone(),
            data,
        };
        let result = self.remote.create_entry(&request).await?;
        let key = result.key.unwrap_or_else(|| entry.key.clone());

        let mut uow = UnitOfWork::begin(self.vault.pool(), "sync.push_create").await?;
        {
            let conn = uow.conn();
            LocalEntryRepo::new(&mut *conn)
                .rebind(entry.id, result.id, &key, entry.version, result.version)
                .await?;
            let mut ledger = SyncLedgerRepo::new(&mut *conn);
            ledger.remove(entry.id).await?;
            ledger.insert(result.id, entry.created_at).await?;
        }
        uow.commit().await?;
        report.pushed_creates += 1;
        Ok(())
    }

    async fn pull(&self, report: &mut SyncReport) -> Result<(), ClientError> {
        let known = {
            let mut conn = self.vault.pool().acquire().await?;
            LocalEntryRepo::new(&mut conn).list_global_versions().await?
        };
        let request = EntriesDiffRequest {
            client_versions: known
                .iter()
                .map(|entry| (entry.id, entry.version))
                .collect(),
        };
        let diff = self.remote.get_entries_diff(&request).await?;
        if diff.entries.is_empty() && diff.delete_ids.is_empty() {
            return Ok(());
        }

        let created: HashSet<Uuid> = diff.create_ids.iter().copied().collect();
        let mut uow = UnitOfWork::begin(self.vault.pool(), "sync.pull").await?;
        {
            let conn = uow.conn();
            for remote in &diff.entries {
                let local = LocalEntry {
                    id: remote.id,
                    key: remote.key.clone(),
                    entry_type: remote.entry_type,
                    meta: remote.meta.clone(),
                    data_enc: self.vault.seal(&remote.data)?,
                    version: remote.version,
                    global_version: remote.version,
                    created_at: remote.created_at,
                    updated_at: remote.updated_at,
                };
                LocalEntryRepo::new(&mut *conn).upsert_synced(&local).await?;
                SyncLedgerRepo::new(&mut *conn)
                    .insert(remote.id, remote.created_at)
                    .await?;
                if created.contains(&remote.id) {
                    report.created += 1;
                } else {
                    report.updated += 1;
                }
            }
            for id in &diff.delete_ids {
                LocalEntryRepo::new(&mut *conn).delete(*id).await?;
                SyncLedgerRepo::new(&mut *conn).remove(*id).await?;
                report.deleted += 1;
            }
        }
        uow.commit().await?;
        Ok(())
    }
}
