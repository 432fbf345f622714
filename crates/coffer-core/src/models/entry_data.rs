use serde::{Deserialize, Serialize};

use super::EntryType;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordData {
    pub login: String,
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

impl std::fmt::Debug for PasswordData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordData")
            .field("login", &self.login)
            .field("password", &"REDACTED")
            .field("url", &self.url)
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardData {
    pub holder: String,
    pub number: String,
    pub expiry: String,
    pub cvv: String,
}

impl std::fmt::Debug for CardData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardData")
            .field("holder", &self.holder)
            .field("number", &"REDACTED")
            .field("expiry", &self.expiry)
            .field("cvv", &"REDACTED")
            .finish()
    }
}

/// Typed entry payload. The byte form is selected by the variant:
/// password and card are JSON objects, a note is UTF-8 text, binary is raw.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryData {
    Password(PasswordData),
    Note(String),
    Card(CardData),
    Binary(Vec<u8>),
}

#[derive(Debug)]
pub enum PayloadError {
    Json(serde_json::Error),
    Utf8,
}

impl std::fmt::Display for PayloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "invalid structured payload: {err}"),
            Self::Utf8 => write!(f, "note payload is not valid utf-8"),
        }
    }
}

impl std::error::Error for PayloadError {}

impl EntryData {
    #[must_use]
    pub const fn entry_type(&self) -> EntryType {
        match self {
            Self::Password(_) => EntryType::Password,
            Self::Note(_) => EntryType::Note,
            Self::Card(_) => EntryType::Card,
            Self::Binary(_) => EntryType::Binary,
        }
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, PayloadError> {
        match self {
            Self::Password(data) => serde_json::to_vec(data).map_err(PayloadError::Json),
            Self::Note(text) => Ok(text.as_bytes().to_vec()),
            Self::Card(data) => serde_json::to_vec(data).map_err(PayloadError::Json),
            Self::Binary(bytes) => Ok(bytes.clone()),
        }
    }

    pub fn from_bytes(entry_type: EntryType, bytes: &[u8]) -> Result<Self, PayloadError> {
        match entry_type {
            EntryType::Password => serde_json::from_slice(bytes)
                .map(Self::Password)
                .map_err(PayloadError::Json),
            EntryType::Note => String::from_utf8(bytes.to_vec())
                .map(Self::Note)
                .map_err(|_| PayloadError::Utf8),
            EntryType::Card => serde_json::from_slice(bytes)
                .map(Self::Card)
                .map_err(PayloadError::Json),
            EntryType::Binary => Ok(Self::Binary(bytes.to_vec())),
        }
    }
}
