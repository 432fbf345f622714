use chrono::{DateTime, Utc};
use coffer_core::{EntryType, Meta};
use sqlx_core::from_row::FromRow;
use sqlx_core::row::Row;
use sqlx_core::types::Json;
use sqlx_sqlite::SqliteRow;
use uuid::Uuid;

fn parse_uuid(row: &SqliteRow, column: &str) -> Result<Uuid, sqlx_core::Error> {
    match row.try_get::<String, _>(column) {
        Ok(value) => Uuid::parse_str(&value).map_err(|err| sqlx_core::Error::Decode(Box::new(err))),
        Err(_) => {
            let bytes: Vec<u8> = row.try_get(column)?;
            Uuid::from_slice(&bytes).map_err(|err| sqlx_core::Error::Decode(Box::new(err)))
        }
    }
}

/// Local mirror of a server entry.
///
/// `version` moves on every local edit; `global_version` is the last server
/// version seen and is only written by sync. `global_version == 0` marks an
/// entry the server has never accepted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntry {
    pub id: Uuid,
    pub key: String,
    pub entry_type: EntryType,
    pub meta: Meta,
    pub data_enc: Vec<u8>,
    pub version: i64,
    pub global_version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LocalEntry {
    #[must_use]
    pub fn is_new(&self) -> bool {
        self.global_version == 0
    }

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.is_new() || self.version != self.global_version
    }
}

impl FromRow<'_, SqliteRow> for LocalEntry {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx_core::Error> {
        let entry_type: String = row.try_get("entry_type")?;
        let meta: Json<Meta> = row.try_get("meta")?;
        Ok(Self {
            id: parse_uuid(row, "id")?,
            key: row.try_get("entry_key")?,
            entry_type: entry_type
                .parse()
                .map_err(|err| sqlx_core::Error::Decode(Box::new(err)))?,
            meta: meta.0,
            data_enc: row.try_get("data_enc")?,
            version: row.try_get("version")?,
            global_version: row.try_get("global_version")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl FromRow<'_, SqliteRow> for LedgerEntry {
    fn from_row(row: &SqliteRow) -> Result<Self, sqlx_core::Error> {
        Ok(Self {
            id: parse_uuid(row, "id")?,
            created_at: row.try_get("created_at")?,
        })
    }
}
