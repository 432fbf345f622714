use std::collections::{HashMap, HashSet};

use coffer_core::{get_diff, EntryVersion};
use proptest::collection::hash_map;
use proptest::prelude::*;
use uuid::Uuid;

fn versions() -> impl Strategy<Value = HashMap<u8, i64>> {
    hash_map(any::<u8>(), 1i64..5, 0..40)
}

fn to_entries(map: &HashMap<u8, i64>) -> Vec<EntryVersion> {
    map.iter()
        .map(|(id, version)| EntryVersion::new(Uuid::from_u128(u128::from(*id)), *version))
        .collect()
}

proptest! {
    #[test]
    fn diff_partitions_ids(server in versions(), client in versions()) {
        let diff = get_diff(&to_entries(&server), &to_entries(&client));
        let create: HashSet<_> = diff.create_ids.iter().copied().collect();
        let update: HashSet<_> = diff.update_ids.iter().copied().collect();
        let delete: HashSet<_> = diff.delete_ids.iter().copied().collect();

        prop_assert!(create.is_disjoint(&update));
        prop_assert!(create.is_disjoint(&delete));
        prop_assert!(update.is_disjoint(&delete));

        for (raw, version) in &server {
            let id = Uuid::from_u128(u128::from(*raw));
            match client.get(raw) {
                None => prop_assert!(create.contains(&id)),
                Some(other) if other != version => prop_assert!(update.contains(&id)),
                Some(_) => {
                    prop_assert!(!create.contains(&id) && !update.contains(&id));
                }
            }
        }
        for raw in client.keys() {
            let id = Uuid::from_u128(u128::from(*raw));
            prop_assert_eq!(delete.contains(&id), !server.contains_key(raw));
        }
    }

    #[test]
    fn applying_diff_converges(server in versions(), client in versions()) {
        let diff = get_diff(&to_entries(&server), &to_entries(&client));
        let mut applied: HashMap<Uuid, i64> = to_entries(&client)
            .into_iter()
            .map(|entry| (entry.id, entry.version))
            .collect();
        let server_map: HashMap<Uuid, i64> = to_entries(&server)
            .into_iter()
            .map(|entry| (entry.id, entry.version))
            .collect();
        for id in diff.fetch_ids() {
            applied.insert(id, server_map[&id]);
        }
        for id in &diff.delete_ids {
            applied.remove(id);
        }
        prop_assert_eq!(applied, server_map);
    }
}
