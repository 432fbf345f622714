use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::EntryType;

/// Free-form string attributes attached to an entry (description, filename, ...).
pub type Meta = BTreeMap<String, String>;

/// Server-side entry row. `data_enc` is the payload sealed by the server cipher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: Uuid,
    pub user_id: Uuid,
    pub key: String,
    pub entry_type: EntryType,
    pub meta: Meta,
    pub data_enc: Vec<u8>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `{id, version}` projection used for diffing; never carries payload data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryVersion {
    pub id: Uuid,
    pub version: i64,
}

impl EntryVersion {
    #[must_use]
    pub const fn new(id: Uuid, version: i64) -> Self {
        Self { id, version }
    }
}

#[derive(Clone)]
pub struct User {
    pub id: Uuid,
    pub login: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("login", &self.login)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}
