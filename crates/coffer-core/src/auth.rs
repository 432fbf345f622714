use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Authenticated caller, resolved from a bearer token before any handler runs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: Uuid,
    pub login: String,
}
