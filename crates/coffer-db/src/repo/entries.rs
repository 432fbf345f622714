use super::prelude::*;
use tracing::{instrument, Span};

const ENTRY_COLUMNS: &str =
    "id, user_id, entry_key, entry_type, meta, data_enc, version, created_at, updated_at";

/// Server entry store. Every statement is scoped by `user_id`.
pub struct EntryRepo<'a> {
    conn: &'a mut PgConnection,
}

impl<'a> EntryRepo<'a> {
    pub fn new(conn: &'a mut PgConnection) -> Self {
        Self { conn }
    }

    /// Inserts unless a row with a clashing unique column exists.
    ///
    /// Returns `false` on conflict; the surrounding transaction stays usable.
    #[instrument(
        level = "debug",
        skip(self, entry),
        fields(
            entry_id = %entry.id,
            user_id = %entry.user_id,
            db.system = "postgresql",
            db.operation = "INSERT",
            db.query = "entries.insert_if_absent",
            db.rows
        )
    )]
    pub async fn insert_if_absent(&mut self, entry: &Entry) -> Result<bool, sqlx_core::Error> {
        query!(
            r#"
            INSERT INTO entries (
                id, user_id, entry_key, entry_type, meta, data_enc, version, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT DO NOTHING
            "#,
            entry.id,
            entry.user_id,
            entry.key.as_str(),
            entry.entry_type.as_str(),
            Json(&entry.meta),
            &entry.data_enc,
            entry.version,
            entry.created_at,
            entry.updated_at
        )
        .execute(&mut *self.conn)
        .await
        .map(|result| {
            Span::current().record("db.rows", result.rows_affected() as i64);
            result.rows_affected() == 1
        })
    }

    #[instrument(
        level = "debug",
        skip(self),
        fields(entry_id = %id, user_id = %user_id, db.system = "postgresql", db.operation = "SELECT", db.query = "entries.get")
    )]
    pub async fn get(&mut self, user_id: Uuid, id: Uuid) -> Result<Option<Entry>, sqlx_core::Error> {
        let sql = format!("SELECT {ENTRY_COLUMNS} FROM entries WHERE id = $1 AND user_id = $2");
        query_as!(Entry, &sql, id, user_id)
            .fetch_optional(&mut *self.conn)
            .await
    }

    /// Loads the row and locks it until the transaction ends.
    #[instrument(
        level = "debug",
        skip(self),
        fields(entry_id = %id, user_id = %user_id, db.system = "postgresql", db.operation = "SELECT", db.query = "entries.get_for_update")
    )]
    pub async fn get_for_update(
        &mut self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Entry>, sqlx_core::Error> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE id = $1 AND user_id = $2 FOR UPDATE"
        );
        query_as!(Entry, &sql, id, user_id)
            .fetch_optional(&mut *self.conn)
            .await
    }

    #[instrument(
        level = "debug",
        skip(self),
        fields(user_id = %user_id, db.system = "postgresql", db.operation = "SELECT", db.query = "entries.list_versions", db.rows)
    )]
    pub async fn list_versions(
        &mut self,
        user_id: Uuid,
    ) -> Result<Vec<EntryVersion>, sqlx_core::Error> {
        let rows = query_as!(
            EntryVersion,
            r#"
            SELECT id, version
            FROM entries
            WHERE user_id = $1
            ORDER BY id
            "#,
            user_id
        )
        .fetch_all(&mut *self.conn)
        .await?;
        Span::current().record("db.rows", rows.len() as i64);
        Ok(rows)
    }

    #[instrument(
        level = "debug",
        skip(self, ids),
        fields(user_id = %user_id, ids = ids.len(), db.system = "postgresql", db.operation = "SELECT", db.query = "entries.get_by_ids", db.rows)
    )]
    pub async fn get_by_ids(
        &mut self,
        user_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Entry>, sqlx_core::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} FROM entries WHERE user_id = $1 AND id = ANY($2) ORDER BY id"
        );
        let rows = query_as!(Entry, &sql, user_id, ids)
            .fetch_all(&mut *self.conn)
            .await?;
        Span::current().record("db.rows", rows.len() as i64);
        Ok(rows)
    }

    /// Writes the mutable columns if the stored version still equals
    /// `expected_version`. Returns the number of rows changed.
    #[instrument(
        level = "debug",
        skip(self, entry),
        fields(
            entry_id = %entry.id,
            user_id = %entry.user_id,
            expected_version,
            db.system = "postgresql",
            db.operation = "UPDATE",
            db.query = "entries.update",
            db.rows
        )
    )]
    pub async fn update(
        &mut self,
        entry: &Entry,
        expected_version: i64,
    ) -> Result<u64, sqlx_core::Error> {
        query!(
            r#"
            UPDATE entries
            SET meta = $3,
                data_enc = $4,
                version = $5,
                updated_at = $6
            WHERE id = $1 AND user_id = $2 AND version = $7
            "#,
            entry.id,
            entry.user_id,
            Json(&entry.meta),
            &entry.data_enc,
            entry.version,
            entry.updated_at,
            expected_version
        )
        .execute(&mut *self.conn)
        .await
        .map(|result| {
            Span::current().record("db.rows", result.rows_affected() as i64);
            result.rows_affected()
        })
    }

    #[instrument(
        level = "debug",
        skip(self),
        fields(entry_id = %id, user_id = %user_id, db.system = "postgresql", db.operation = "DELETE", db.query = "entries.delete", db.rows)
    )]
    pub async fn delete(&mut self, user_id: Uuid, id: Uuid) -> Result<u64, sqlx_core::Error> {
        query!(
            r#"
            DELETE FROM entries
            WHERE id = $1 AND user_id = $2
            "#,
            id,
            user_id
        )
        .execute(&mut *self.conn)
        .await
        .map(|result| {
            Span::current().record("db.rows", result.rows_affected() as i64);
            result.rows_affected()
        })
    }

    #[instrument(
        level = "debug",
        skip(self),
        fields(user_id = %user_id, db.system = "postgresql", db.operation = "SELECT", db.query = "entries.count")
    )]
    pub async fn count(&mut self, user_id: Uuid) -> Result<i64, sqlx_core::Error> {
        use sqlx_core::row::Row;

        let row = query!("SELECT COUNT(*) AS total FROM entries WHERE user_id = $1", user_id)
            .fetch_one(&mut *self.conn)
            .await?;
        row.try_get::<i64, _>("total")
    }
}
