use chrono::{DateTime, Duration, Utc};
use coffer_core::MAX_KEY_LEN;
use coffer_server::domains::entries::conflict::{conflict_key, plan_update, UpdatePlan};
use proptest::prelude::*;

fn instant(offset_secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::UNIX_EPOCH + Duration::seconds(1_700_000_000 + offset_secs)
}

proptest! {
    #[test]
    fn update_plan_is_monotonic(
        current in 1i64..1_000_000,
        expected in 1i64..1_000_000,
        stored_offset in -10_000i64..10_000,
        now_offset in -10_000i64..10_000,
    ) {
        let stored_at = instant(stored_offset);
        let now = instant(now_offset);
        match plan_update(current, expected, stored_at, now) {
            UpdatePlan::InPlace { version, updated_at } => {
                prop_assert_eq!(current, expected);
                prop_assert_eq!(version, current + 1);
                prop_assert!(updated_at >= stored_at);
                prop_assert!(updated_at >= now);
            }
            UpdatePlan::Fork => prop_assert_ne!(current, expected),
        }
    }

    #[test]
    fn conflict_key_fits_and_keeps_marker(key in "\\PC{1,300}", version in 1i64..100_000) {
        let forked = conflict_key(&key, version);
        prop_assert!(forked.len() <= MAX_KEY_LEN);
        let marker = format!("_conflict_{version}_");
        let at = forked.rfind(&marker);
        prop_assert!(at.is_some());
        let prefix = &forked[..at.unwrap_or_default()];
        prop_assert!(key.starts_with(prefix));
    }
}
