use coffer_core::EntryVersion;
use sqlx_core::types::Json;
use sqlx_sqlite::SqliteConnection;
use uuid::Uuid;

use crate::local::LocalEntry;

const ENTRY_COLUMNS: &str = "id, entry_key, entry_type, meta, data_enc, version, global_version, created_at, updated_at";

pub struct LocalEntryRepo<'a> {
    conn: &'a mut SqliteConnection,
}

impl<'a> LocalEntryRepo<'a> {
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&mut self, entry: &LocalEntry) -> Result<(), sqlx_core::Error> {
        query!(
            r#"
            INSERT INTO entries (
                id, entry_key, entry_type, meta, data_enc, version, global_version,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            entry.id,
            entry.key.as_str(),
            entry.entry_type.as_str(),
            Json(&entry.meta),
            &entry.data_enc,
            entry.version,
            entry.global_version,
            entry.created_at,
            entry.updated_at
        )
        .execute(&mut *self.conn)
        .await
        .map(|_| ())
    }

    pub async fn get(&mut self, id: Uuid) -> Result<Option<LocalEntry>, sqlx_core::Error> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = ?1");
        query_as!(LocalEntry, &sql, id)
            .fetch_optional(&mut *self.conn)
            .await
    }

    pub async fn list(&mut self) -> Result<Vec<LocalEntry>, sqlx_core::Error> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries ORDER BY entry_key, id");
        query_as!(LocalEntry, &sql)
            .fetch_all(&mut *self.conn)
            .await
    }

    /// Entries with edits the server has not accepted yet.
    pub async fn list_pending(&mut self) -> Result<Vec<LocalEntry>, sqlx_core::Error> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM entries \
             WHERE global_version = 0 OR version <> global_version \
             ORDER BY created_at, id"
        );
        query_as!(LocalEntry, &sql)
            .fetch_all(&mut *self.conn)
            .await
    }

    /// `{id, global_version}` of every entry the server knows about.
    pub async fn list_global_versions(&mut self) -> Result<Vec<EntryVersion>, sqlx_core::Error> {
        query_as!(
            EntryVersion,
            r#"
            SELECT id, global_version AS version
            FROM entries
            WHERE global_version > 0
            ORDER BY id
            "#
        )
        .fetch_all(&mut *self.conn)
        .await
    }

    /// Local edit: rewrites payload and local version, never `global_version`.
    pub async fn update_local(&mut self, entry: &LocalEntry) -> Result<u64, sqlx_core::Error> {
        query!(
            r#"
            UPDATE entries
            SET meta = ?2,
                data_enc = ?3,
                version = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
            entry.id,
            Json(&entry.meta),
            &entry.data_enc,
            entry.version,
            entry.updated_at
        )
        .execute(&mut *self.conn)
        .await
        .map(|result| result.rows_affected())
    }

    /// Writes server state over whatever the row holds.
    pub async fn upsert_synced(&mut self, entry: &LocalEntry) -> Result<(), sqlx_core::Error> {
        query!(
            r#"
            INSERT INTO entries (
                id, entry_key, entry_type, meta, data_enc, version, global_version,
                created_at, updated_at
            )
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            ON CONFLICT(id) DO UPDATE SET
                entry_key = excluded.entry_key,
                entry_type = excluded.entry_type,
                meta = excluded.meta,
                data_enc = excluded.data_enc,
                version = excluded.version,
                global_version = excluded.global_version,
                created_at = excluded.created_at,
                updated_at = excluded.updated_at
            "#,
            entry.id,
            entry.key.as_str(),
            entry.entry_type.as_str(),
            Json(&entry.meta),
            &entry.data_enc,
            entry.version,
            entry.global_version,
            entry.created_at,
            entry.updated_at
        )
        .execute(&mut *self.conn)
        .await
        .map(|_| ())
    }

    /// Moves a locally created row onto the identity the server assigned.
    /// Edits made after `pushed_version` was read stay pending.
    pub async fn rebind(
        &mut self,
        local_id: Uuid,
        server_id: Uuid,
        key: &str,
        pushed_version: i64,
        global_version: i64,
    ) -> Result<u64, sqlx_core::Error> {
        query!(
            r#"
            UPDATE entries
            SET id = ?2,
                entry_key = ?3,
                version = CASE WHEN version = ?4 THEN ?5 ELSE version END,
                global_version = ?5
            WHERE id = ?1
            "#,
            local_id,
            server_id,
            key,
            pushed_version,
            global_version
        )
        .execute(&mut *self.conn)
        .await
        .map(|result| result.rows_affected())
    }

    /// Records a pushed edit. The local version is only reset when the row was
    /// not edited again after `pushed_version` was read.
    pub async fn mark_pushed(
        &mut self,
        id: Uuid,
        pushed_version: i64,
        global_version: i64,
    ) -> Result<u64, sqlx_core::Error> {
        query!(
            r#"
            UPDATE entries
            SET version = CASE WHEN version = ?2 THEN ?3 ELSE version END,
                global_version = ?3
            WHERE id = ?1
            "#,
            id,
            pushed_version,
            global_version
        )
        .execute(&mut *self.conn)
        .await
        .map(|result| result.rows_affected())
    }

    pub async fn delete(&mut self, id: Uuid) -> Result<u64, sqlx_core::Error> {
        query!("DELETE FROM entries WHERE id = ?1", id)
            .execute(&mut *self.conn)
            .await
            .map(|result| result.rows_affected())
    }
}
