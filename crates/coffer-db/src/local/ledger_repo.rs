use chrono::{DateTime, Utc};
use sqlx_sqlite::SqliteConnection;
use uuid::Uuid;

use crate::local::LedgerEntry;

/// Ids the client has materialized from, or pushed to, the server.
pub struct SyncLedgerRepo<'a> {
    conn: &'a mut SqliteConnection,
}

impl<'a> SyncLedgerRepo<'a> {
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn insert(&mut self, id: Uuid, created_at: DateTime<Utc>) -> Result<(), sqlx_core::Error> {
        query!(
            r#"
            INSERT INTO sync_ledger (id, created_at)
            VALUES (?1, ?2)
            ON CONFLICT(id) DO NOTHING
            "#,
            id,
            created_at
        )
        .execute(&mut *self.conn)
        .await
        .map(|_| ())
    }

    pub async fn remove(&mut self, id: Uuid) -> Result<u64, sqlx_core::Error> {
        query!("DELETE FROM sync_ledger WHERE id = ?1", id)
            .execute(&mut *self.conn)
            .await
            .map(|result| result.rows_affected())
    }

    pub async fn list(&mut self) -> Result<Vec<LedgerEntry>, sqlx_core::Error> {
        query_as!(
            LedgerEntry,
            r#"
            SELECT id, created_at
            FROM sync_ledger
            ORDER BY created_at, id
            "#
        )
        .fetch_all(&mut *self.conn)
        .await
    }

    /// Ledger rows whose local entry is gone: deletions the server has not seen yet.
    pub async fn list_orphaned(&mut self) -> Result<Vec<LedgerEntry>, sqlx_core::Error> {
        query_as!(
            LedgerEntry,
            r#"
            SELECT l.id, l.created_at
            FROM sync_ledger l
            LEFT JOIN entries e ON e.id = l.id
            WHERE e.id IS NULL
            ORDER BY l.created_at, l.id
            "#
        )
        .fetch_all(&mut *self.conn)
        .await
    }
}
