use uuid::Uuid;

use crate::{EntryType, Meta, MAX_DATA_SIZE, MAX_KEY_LEN};

/// Every violation found in one request, in detection order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors(Vec<&'static str>);

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, code: &'static str) {
        self.0.push(code);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn codes(&self) -> &[&'static str] {
        &self.0
    }

    #[must_use]
    pub fn contains(&self, code: &str) -> bool {
        self.0.iter().any(|value| *value == code)
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl std::fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid input: {}", self.0.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

impl From<&'static str> for ValidationErrors {
    fn from(code: &'static str) -> Self {
        Self(vec![code])
    }
}

pub fn check_key(errors: &mut ValidationErrors, key: &str) {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        errors.push("key_required");
    } else if trimmed.len() > MAX_KEY_LEN {
        errors.push("key_too_long");
    }
}

pub fn check_data(errors: &mut ValidationErrors, data: &[u8]) {
    if data.is_empty() {
        errors.push("data_required");
    } else if data.len() > MAX_DATA_SIZE {
        errors.push("data_too_large");
    }
}

/// A create command that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub user_id: Uuid,
    pub key: String,
    pub entry_type: EntryType,
    pub meta: Meta,
    pub data: Vec<u8>,
}

impl NewEntry {
    pub fn validate(
        user_id: Uuid,
        key: &str,
        entry_type: &str,
        meta: Meta,
        data: Vec<u8>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if user_id.is_nil() {
            errors.push("user_required");
        }
        check_key(&mut errors, key);
        let parsed = entry_type.parse::<EntryType>().ok();
        if parsed.is_none() {
            errors.push("type_invalid");
        }
        check_data(&mut errors, &data);
        errors.into_result()?;
        let entry_type = parsed.ok_or_else(|| ValidationErrors::from("type_invalid"))?;
        Ok(Self {
            user_id,
            key: key.trim().to_string(),
            entry_type,
            meta,
            data,
        })
    }
}

/// An update command that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryChange {
    pub id: Uuid,
    pub user_id: Uuid,
    pub expected_version: i64,
    pub meta: Meta,
    pub data: Vec<u8>,
}

impl EntryChange {
    pub fn validate(
        id: Uuid,
        user_id: Uuid,
        expected_version: i64,
        meta: Meta,
        data: Vec<u8>,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if id.is_nil() {
            errors.push("id_required");
        }
        if user_id.is_nil() {
            errors.push("user_required");
        }
        if expected_version <= 0 {
            errors.push("version_required");
        }
        check_data(&mut errors, &data);
        errors.into_result()?;
        Ok(Self {
            id,
            user_id,
            expected_version,
            meta,
            data,
        })
    }
}
