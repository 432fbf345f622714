#![cfg(feature = "sqlite")]

use chrono::{Duration, Utc};
use coffer_core::{EntryType, EntryVersion, Meta};
use coffer_db::local::{LocalEntry, LocalEntryRepo, MetadataRepo, SyncLedgerRepo};
use coffer_db::{connect_sqlite_memory, migrate_local, SqlitePool, UnitOfWork};
use uuid::Uuid;

async fn setup_db() -> SqlitePool {
    let pool = connect_sqlite_memory().await.expect("connect sqlite");
    migrate_local(&pool).await.expect("migrate");
    pool
}

fn local_entry(key: &str, version: i64, global_version: i64) -> LocalEntry {
    let now = Utc::now();
    let mut meta = Meta::new();
    meta.insert("note".to_string(), key.to_uppercase());
    LocalEntry {
        id: Uuid::now_v7(),
        key: key.to_string(),
        entry_type: EntryType::Note,
        meta,
        data_enc: vec![1, 2, 3],
        version,
        global_version,
        created_at: now,
        updated_at: now,
    }
}

#[tokio::test]
async fn insert_get_and_list_roundtrip() {
    let pool = setup_db().await;
    let mut conn = pool.acquire().await.expect("acquire");
    let mut repo = LocalEntryRepo::new(&mut conn);

    let b = local_entry("b", 1, 0);
    let a = local_entry("a", 2, 2);
    repo.insert(&b).await.expect("insert b");
    repo.insert(&a).await.expect("insert a");

    let fetched = repo.get(a.id).await.expect("get").expect("exists");
    assert_eq!(fetched.key, "a");
    assert_eq!(fetched.meta.get("note").map(String::as_str), Some("A"));
    assert_eq!(fetched.global_version, 2);

    let keys: Vec<_> = repo
        .list()
        .await
        .expect("list")
        .into_iter()
        .map(|entry| entry.key)
        .collect();
    assert_eq!(keys, vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn pending_and_global_versions_split_on_sync_state() {
    let pool = setup_db().await;
    let mut conn = pool.acquire().await.expect("acquire");
    let mut repo = LocalEntryRepo::new(&mut conn);

    let fresh = local_entry("fresh", 1, 0);
    let clean = local_entry("clean", 3, 3);
    let edited = local_entry("edited", 4, 3);
    for entry in [&fresh, &clean, &edited] {
        repo.insert(entry).await.expect("insert");
    }

    let pending: Vec<_> = repo
        .list_pending()
        .await
        .expect("pending")
        .into_iter()
        .map(|entry| entry.id)
        .collect();
    assert_eq!(pending.len(), 2);
    assert!(pending.contains(&fresh.id));
    assert!(pending.contains(&edited.id));

    let mut versions = repo.list_global_versions().await.expect("versions");
    versions.sort_by_key(|entry| entry.id);
    let mut expected = vec![
        EntryVersion::new(clean.id, 3),
        EntryVersion::new(edited.id, 3),
    ];
    expected.sort_by_key(|entry| entry.id);
    assert_eq!(versions, expected);
}

#[tokio::test]
async fn update_local_keeps_global_version() {
    let pool = setup_db().await;
    let mut conn = pool.acquire().await.expect("acquire");
    let mut repo = LocalEntryRepo::new(&mut conn);

    let mut entry = local_entry("k1", 2, 2);
    repo.insert(&entry).await.expect("insert");
    entry.version = 3;
    entry.global_version = 99;
    entry.data_enc = vec![9];
    entry.updated_at = entry.updated_at + Duration::seconds(1);
    assert_eq!(repo.update_local(&entry).await.expect("update"), 1);

    let stored = repo.get(entry.id).await.expect("get").expect("exists");
    assert_eq!(stored.version, 3);
    assert_eq!(stored.global_version, 2);
    assert_eq!(stored.data_enc, vec![9]);
    assert!(stored.is_dirty());
}

#[tokio::test]
async fn upsert_synced_overwrites_local_state() {
    let pool = setup_db().await;
    let mut conn = pool.acquire().await.expect("acquire");
    let mut repo = LocalEntryRepo::new(&mut conn);

    let mut entry = local_entry("k1", 5, 3);
    repo.insert(&entry).await.expect("insert");
    entry.key = "server-key".to_string();
    entry.version = 4;
    entry.global_version = 4;
    repo.upsert_synced(&entry).await.expect("upsert");

    let stored = repo.get(entry.id).await.expect("get").expect("exists");
    assert_eq!(stored.key, "server-key");
    assert_eq!((stored.version, stored.global_version), (4, 4));
    assert!(!stored.is_dirty());
}

#[tokio::test]
async fn rebind_and_mark_pushed_respect_later_edits() {
    let pool = setup_db().await;
    let mut conn = pool.acquire().await.expect("acquire");
    let mut repo = LocalEntryRepo::new(&mut conn);

    let created = local_entry("new", 1, 0);
    repo.insert(&created).await.expect("insert");
    let server_id = Uuid::now_v7();
    assert_eq!(
        repo.rebind(created.id, server_id, "new", 1, 1)
            .await
            .expect("rebind"),
        1
    );
    assert!(repo.get(created.id).await.expect("get old").is_none());
    let rebound = repo.get(server_id).await.expect("get new").expect("exists");
    assert_eq!((rebound.version, rebound.global_version), (1, 1));

    // Edited again (version 3) while version 2 was being pushed.
    let edited = local_entry("edited", 3, 1);
    repo.insert(&edited).await.expect("insert");
    repo.mark_pushed(edited.id, 2, 2).await.expect("mark");
    let stored = repo.get(edited.id).await.expect("get").expect("exists");
    assert_eq!((stored.version, stored.global_version), (3, 2));
    assert!(stored.is_dirty());

    repo.mark_pushed(edited.id, 3, 3).await.expect("mark");
    let stored = repo.get(edited.id).await.expect("get").expect("exists");
    assert_eq!((stored.version, stored.global_version), (3, 3));
}

#[tokio::test]
async fn ledger_reports_orphaned_ids() {
    let pool = setup_db().await;
    let mut conn = pool.acquire().await.expect("acquire");

    let kept = local_entry("kept", 1, 1);
    let removed = local_entry("removed", 1, 1);
    {
        let mut repo = LocalEntryRepo::new(&mut conn);
        repo.insert(&kept).await.expect("insert kept");
        repo.insert(&removed).await.expect("insert removed");
    }
    {
        let mut ledger = SyncLedgerRepo::new(&mut conn);
        ledger.insert(kept.id, Utc::now()).await.expect("ledger kept");
        ledger.insert(removed.id, Utc::now()).await.expect("ledger removed");
        ledger.insert(removed.id, Utc::now()).await.expect("ledger twice");
    }
    LocalEntryRepo::new(&mut conn)
        .delete(removed.id)
        .await
        .expect("delete");

    let mut ledger = SyncLedgerRepo::new(&mut conn);
    assert_eq!(ledger.list().await.expect("list").len(), 2);
    let orphaned: Vec<_> = ledger
        .list_orphaned()
        .await
        .expect("orphaned")
        .into_iter()
        .map(|entry| entry.id)
        .collect();
    assert_eq!(orphaned, vec![removed.id]);
    assert_eq!(ledger.remove(removed.id).await.expect("remove"), 1);
    assert!(ledger.list_orphaned().await.expect("orphaned").is_empty());
}

#[tokio::test]
async fn metadata_set_get_delete() {
    let pool = setup_db().await;
    let mut conn = pool.acquire().await.expect("acquire");
    let mut repo = MetadataRepo::new(&mut conn);

    assert_eq!(repo.get_value("access_token").await.expect("get"), None);
    repo.set_value("access_token", "one").await.expect("set");
    repo.set_value("access_token", "two").await.expect("overwrite");
    assert_eq!(
        repo.get_value("access_token").await.expect("get").as_deref(),
        Some("two")
    );
    assert_eq!(repo.delete_value("access_token").await.expect("delete"), 1);
    assert_eq!(repo.get_value("access_token").await.expect("get"), None);
}

#[tokio::test]
async fn unit_of_work_rolls_back_on_drop() {
    let pool = setup_db().await;
    let entry = local_entry("k1", 1, 0);

    {
        let mut uow = UnitOfWork::begin(&pool, "test_drop").await.expect("begin");
        LocalEntryRepo::new(uow.conn())
            .insert(&entry)
            .await
            .expect("insert");
    }

    let mut conn = pool.acquire().await.expect("acquire");
    assert!(LocalEntryRepo::new(&mut conn)
        .get(entry.id)
        .await
        .expect("get")
        .is_none());
    drop(conn);

    let mut uow = UnitOfWork::begin(&pool, "test_commit").await.expect("begin");
    LocalEntryRepo::new(uow.conn())
        .insert(&entry)
        .await
        .expect("insert");
    uow.commit().await.expect("commit");

    let mut conn = pool.acquire().await.expect("acquire");
    assert!(LocalEntryRepo::new(&mut conn)
        .get(entry.id)
        .await
        .expect("get")
        .is_some());
}
