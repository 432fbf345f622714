#[cfg(any(feature = "postgres", feature = "sqlite"))]
use sqlx_core::from_row::FromRow;
#[cfg(any(feature = "postgres", feature = "sqlite"))]
use sqlx_core::row::Row;
#[cfg(feature = "postgres")]
use sqlx_core::types::Json;
#[cfg(feature = "postgres")]
use sqlx_postgres::PgRow;
#[cfg(feature = "sqlite")]
use sqlx_sqlite::SqliteRow;

#[cfg(any(feature = "postgres", feature = "sqlite"))]
use super::*;

#[cfg(feature = "postgres")]
fn parse_entry_type(value: String) -> Result<EntryType, sqlx_core::Error> {
    value
        .parse()
        .map_err(|err: EnumParseError| sqlx_core::Error::Decode(Box::new(err)))
}

macro_rules! impl_from_row {
    (pg $ty:ty, $row:ident => $body:block) => {
        #[cfg(feature = "postgres")]
        impl FromRow<'_, PgRow> for $ty {
            fn from_row($row: &PgRow) -> Result<Self, sqlx_core::Error> {
                $body
            }
        }
    };
    ($ty:ty, $row:ident => $body:block) => {
        #[cfg(feature = "sqlite")]
        impl FromRow<'_, SqliteRow> for $ty {
            fn from_row($row: &SqliteRow) -> Result<Self, sqlx_core::Error> {
                $body
            }
        }

        #[cfg(feature = "postgres")]
        impl FromRow<'_, PgRow> for $ty {
            fn from_row($row: &PgRow) -> Result<Self, sqlx_core::Error> {
                $body
            }
        }
    };
}

impl_from_row!(EntryVersion, row => {
        Ok(Self {
            id: row.try_get("id")?,
            version: row.try_get("version")?,
        })
    }
);

impl_from_row!(pg Entry, row => {
        let meta: Option<Json<Meta>> = row.try_get("meta")?;
        Ok(Self {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            key: row.try_get("entry_key")?,
            entry_type: parse_entry_type(row.try_get("entry_type")?)?,
            meta: meta.map(|value| value.0).unwrap_or_default(),
            data_enc: row.try_get("data_enc")?,
            version: row.try_get("version")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
);

impl_from_row!(pg User, row => {
        Ok(Self {
            id: row.try_get("id")?,
            login: row.try_get("login")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
        })
    }
);
