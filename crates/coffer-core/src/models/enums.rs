use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Password,
    Note,
    Card,
    Binary,
}

#[derive(Debug)]
pub struct EnumParseError {
    enum_name: &'static str,
    value: String,
}

impl EnumParseError {
    pub(crate) fn new(enum_name: &'static str, value: impl Into<String>) -> Self {
        Self {
            enum_name,
            value: value.into(),
        }
    }
}

impl std::fmt::Display for EnumParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "invalid {} value: {}", self.enum_name, self.value)
    }
}

impl std::error::Error for EnumParseError {}

impl EntryType {
    pub const ALL: [Self; 4] = [Self::Password, Self::Note, Self::Card, Self::Binary];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Password => "password",
            Self::Note => "note",
            Self::Card => "card",
            Self::Binary => "binary",
        }
    }
}

impl std::str::FromStr for EntryType {
    type Err = EnumParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "password" => Ok(Self::Password),
            "note" => Ok(Self::Note),
            "card" => Ok(Self::Card),
            "binary" => Ok(Self::Binary),
            _ => Err(EnumParseError::new("entry_type", value)),
        }
    }
}

impl std::fmt::Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
