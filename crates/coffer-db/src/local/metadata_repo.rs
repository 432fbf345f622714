use sqlx_core::row::Row;
use sqlx_sqlite::SqliteConnection;

pub struct MetadataRepo<'a> {
    conn: &'a mut SqliteConnection,
}

impl<'a> MetadataRepo<'a> {
    pub fn new(conn: &'a mut SqliteConnection) -> Self {
        Self { conn }
    }

    pub async fn get_value(&mut self, key: &str) -> Result<Option<String>, sqlx_core::Error> {
        let row = query!(
            r#"
            SELECT value
            FROM metadata
            WHERE key = ?1
            "#,
            key
        )
        .fetch_optional(&mut *self.conn)
        .await?;
        match row {
            Some(row) => Ok(Some(row.try_get::<String, _>("value")?)),
            None => Ok(None),
        }
    }

    pub async fn set_value(&mut self, key: &str, value: &str) -> Result<(), sqlx_core::Error> {
        query!(
            r#"
            INSERT INTO metadata (key, value)
            VALUES (?1, ?2)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value
            "#,
            key,
            value
        )
        .execute(&mut *self.conn)
        .await
        .map(|_| ())
    }

    pub async fn delete_value(&mut self, key: &str) -> Result<u64, sqlx_core::Error> {
        query!("DELETE FROM metadata WHERE key = ?1", key)
            .execute(&mut *self.conn)
            .await
            .map(|result| result.rows_affected())
    }
}
