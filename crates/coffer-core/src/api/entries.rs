use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EntryType, EntryVersion, Meta};

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreateEntryRequest {
    pub key: String,
    #[serde(rename = "type")]
    pub entry_type: String,
    #[serde(default)]
    pub meta: Meta,
    #[serde(with = "super::b64")]
    pub data: Vec<u8>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateEntryRequest {
    #[serde(default)]
    pub meta: Meta,
    #[serde(with = "super::b64")]
    pub data: Vec<u8>,
    /// Server version the caller last observed.
    pub version: i64,
}

/// Identity of the entry a mutation landed on. `key` is set on create and
/// update so callers can mirror a conflict-renamed key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRef {
    pub id: Uuid,
    pub version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryDto {
    pub id: Uuid,
    pub key: String,
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    #[serde(default)]
    pub meta: Meta,
    #[serde(with = "super::b64")]
    pub data: Vec<u8>,
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for EntryDto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntryDto")
            .field("id", &self.id)
            .field("key", &self.key)
            .field("entry_type", &self.entry_type)
            .field("data_len", &self.data.len())
            .field("version", &self.version)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntriesDiffRequest {
    #[serde(default)]
    pub client_versions: HashMap<Uuid, i64>,
}

impl EntriesDiffRequest {
    #[must_use]
    pub fn versions(&self) -> Vec<EntryVersion> {
        self.client_versions
            .iter()
            .map(|(id, version)| EntryVersion::new(*id, *version))
            .collect()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EntriesDiffResponse {
    pub create_ids: Vec<Uuid>,
    pub update_ids: Vec<Uuid>,
    pub delete_ids: Vec<Uuid>,
    pub entries: Vec<EntryDto>,
}
