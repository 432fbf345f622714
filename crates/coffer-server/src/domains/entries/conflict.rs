//! Fork-on-conflict helpers. A losing write is never rejected; it lands on a
//! new entry whose key carries the conflict marker.

use chrono::{DateTime, Utc};
use coffer_core::{CONFLICT_MARKER, MAX_KEY_LEN};

/// What an update does with the row it locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdatePlan {
    /// Versions agree: rewrite in place.
    InPlace {
        version: i64,
        updated_at: DateTime<Utc>,
    },
    /// Caller saw an older version: keep the row, fork the write.
    Fork,
}

#[must_use]
pub fn plan_update(
    current_version: i64,
    expected_version: i64,
    current_updated_at: DateTime<Utc>,
    now: DateTime<Utc>,
) -> UpdatePlan {
    if current_version != expected_version {
        return UpdatePlan::Fork;
    }
    UpdatePlan::InPlace {
        version: current_version + 1,
        // Clock steps backwards must not make updated_at decrease.
        updated_at: now.max(current_updated_at),
    }
}

/// `{key}_conflict_{version}_{8 hex}` with a fresh random discriminator.
#[must_use]
pub fn conflict_key(key: &str, version: i64) -> String {
    conflict_key_with(key, version, &format!("{:08x}", rand::random::<u32>()))
}

pub(crate) fn conflict_key_with(key: &str, version: i64, discriminator: &str) -> String {
    let suffix = format!("{CONFLICT_MARKER}{version}_{discriminator}");
    let budget = MAX_KEY_LEN.saturating_sub(suffix.len());
    let mut end = key.len().min(budget);
    while !key.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{suffix}", &key[..end])
}
