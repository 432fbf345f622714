//! Version-map reconciliation between the server and one client.

use std::collections::HashMap;

use uuid::Uuid;

use crate::EntryVersion;

/// Actions the client must take to match the server.
///
/// The three id lists are disjoint and sorted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntriesDiff {
    pub create_ids: Vec<Uuid>,
    pub update_ids: Vec<Uuid>,
    pub delete_ids: Vec<Uuid>,
}

impl EntriesDiff {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.create_ids.is_empty() && self.update_ids.is_empty() && self.delete_ids.is_empty()
    }

    /// Ids whose full records the client needs (create and update).
    #[must_use]
    pub fn fetch_ids(&self) -> Vec<Uuid> {
        self.create_ids
            .iter()
            .chain(self.update_ids.iter())
            .copied()
            .collect()
    }
}

fn version_map(versions: &[EntryVersion]) -> HashMap<Uuid, i64> {
    // Duplicate ids collapse, the later pair wins.
    versions
        .iter()
        .map(|entry| (entry.id, entry.version))
        .collect()
}

/// Compares the server's authoritative versions with what the client holds.
///
/// Server-only ids are created on the client, ids whose versions differ are
/// updated (server wins), and client-only ids are deleted.
#[must_use]
pub fn get_diff(server: &[EntryVersion], client: &[EntryVersion]) -> EntriesDiff {
    let server_map = version_map(server);
    let client_map = version_map(client);

    let mut diff = EntriesDiff::default();
    for (id, server_version) in &server_map {
        match client_map.get(id) {
            None => diff.create_ids.push(*id),
            Some(client_version) if client_version != server_version => {
                diff.update_ids.push(*id);
            }
            Some(_) => {}
        }
    }
    diff.delete_ids = client_map
        .keys()
        .filter(|id| !server_map.contains_key(id))
        .copied()
        .collect();

    diff.create_ids.sort_unstable();
    diff.update_ids.sort_unstable();
    diff.delete_ids.sort_unstable();
    diff
}
