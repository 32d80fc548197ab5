use std::sync::Arc;
use std::thread;

use tempfile::TempDir;

use indexsync_core::error::Error;
use indexsync_core::model::{License, Project};
use indexsync_core::traits::{IndexedEntity, ObjectIndexer};
use indexsync_core::types::IndexKind;
use indexsync_text::{EntityIndexer, IndexStore, TextSearcher};

const HEAP: usize = 15_000_000;

fn disk_store() -> (TempDir, IndexStore) {
    let tmp = TempDir::new().unwrap();
    let store = IndexStore::open(tmp.path().join("index"), HEAP).expect("store");
    (tmp, store)
}

fn indexer(store: &IndexStore, kind: IndexKind) -> EntityIndexer {
    EntityIndexer::new(store.handle(kind).expect("handle"))
}

#[test]
fn license_add_update_remove_scenario() {
    let (_tmp, store) = disk_store();
    let licenses = indexer(&store, IndexKind::License);
    let handle = store.handle(IndexKind::License).unwrap();

    licenses.add(&License::new("u1", "MIT", "MIT License")).expect("add");
    let doc = handle.get_by_key("u1").unwrap().expect("indexed");
    assert_eq!(doc.get("licenseid"), Some("MIT"));
    assert_eq!(doc.get("name"), Some("MIT License"));

    licenses.update(&License::new("u1", "MIT", "MIT License v2")).expect("update");
    let doc = handle.get_by_key("u1").unwrap().expect("still indexed");
    assert_eq!(doc.get("licenseid"), Some("MIT"));
    assert_eq!(doc.get("name"), Some("MIT License v2"));
    assert_eq!(handle.count_by_key("u1").unwrap(), 1, "update replaces, never duplicates");

    let gone = License { uuid: "u1".into(), ..License::default() };
    licenses.remove(&gone).expect("remove");
    assert!(handle.get_by_key("u1").unwrap().is_none());
    assert_eq!(handle.num_docs(), 0);
}

#[test]
fn update_of_unknown_entity_matches_add() {
    let added = IndexStore::in_memory(HEAP);
    let upserted = IndexStore::in_memory(HEAP);
    let license = License::new("u2", "Apache-2.0", "Apache License 2.0");

    indexer(&added, IndexKind::License).add(&license).unwrap();
    indexer(&upserted, IndexKind::License).update(&license).unwrap();

    let a = added.handle(IndexKind::License).unwrap();
    let b = upserted.handle(IndexKind::License).unwrap();
    assert_eq!(a.get_by_key("u2").unwrap(), b.get_by_key("u2").unwrap());
    assert_eq!(a.num_docs(), b.num_docs());
    assert_eq!(b.count_by_key("u2").unwrap(), 1);
}

#[test]
fn update_drops_fields_missing_from_new_state() {
    let store = IndexStore::in_memory(HEAP);
    let licenses = indexer(&store, IndexKind::License);
    licenses.add(&License::new("u3", "BSD-3-Clause", "BSD 3-Clause")).unwrap();

    let renamed = License { uuid: "u3".into(), license_id: None, name: Some("BSD Three Clause".into()) };
    licenses.update(&renamed).unwrap();

    let doc = store.handle(IndexKind::License).unwrap().get_by_key("u3").unwrap().expect("indexed");
    assert_eq!(doc.get("licenseid"), None, "no stale value survives the replace");
    assert_eq!(doc.get("name"), Some("BSD Three Clause"));
}

#[test]
fn remove_is_idempotent() {
    let store = IndexStore::in_memory(HEAP);
    let licenses = indexer(&store, IndexKind::License);
    let handle = store.handle(IndexKind::License).unwrap();
    licenses.add(&License::new("keep", "ISC", "ISC License")).unwrap();
    licenses.add(&License::new("drop", "MIT", "MIT License")).unwrap();

    let target = License { uuid: "drop".into(), ..License::default() };
    licenses.remove(&target).expect("first remove");
    let after_once = (handle.num_docs(), handle.get_by_key("keep").unwrap());
    licenses.remove(&target).expect("second remove is a no-op");
    assert_eq!((handle.num_docs(), handle.get_by_key("keep").unwrap()), after_once);

    let never_added = License { uuid: "nope".into(), ..License::default() };
    licenses.remove(&never_added).expect("removing an absent key");
    assert_eq!(handle.num_docs(), 1);
}

#[test]
fn stored_key_is_byte_for_byte() {
    let store = IndexStore::in_memory(HEAP);
    let key = "3F2504E0-4f89-11D3-9A0C-0305E82C3301 ";
    indexer(&store, IndexKind::License).add(&License::new(key, "GPL-3.0-only", "GNU GPL v3")).unwrap();
    let doc = store.handle(IndexKind::License).unwrap().get_by_key(key).unwrap().expect("indexed");
    assert_eq!(doc.key().map(str::as_bytes), Some(key.as_bytes()));
    let lowered = key.to_lowercase();
    assert!(store.handle(IndexKind::License).unwrap().get_by_key(&lowered).unwrap().is_none(), "key lookup is exact");
}

#[test]
fn absent_fields_are_not_written() {
    let store = IndexStore::in_memory(HEAP);
    let bare = License { uuid: "u4".into(), license_id: None, name: None };
    indexer(&store, IndexKind::License).add(&bare).unwrap();
    let doc = store.handle(IndexKind::License).unwrap().get_by_key("u4").unwrap().expect("indexed");
    assert_eq!(doc.key(), Some("u4"));
    assert_eq!(doc.get("licenseid"), None);
    assert_eq!(doc.get("name"), None);
}

#[test]
fn commits_survive_reopen() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("index");
    {
        let store = IndexStore::open(&root, HEAP).unwrap();
        indexer(&store, IndexKind::License).add(&License::new("d1", "MPL-2.0", "Mozilla Public License 2.0")).unwrap();
    }
    let reopened = IndexStore::open(&root, HEAP).unwrap();
    let doc = reopened.handle(IndexKind::License).unwrap().get_by_key("d1").unwrap().expect("durable");
    assert_eq!(doc.get("name"), Some("Mozilla Public License 2.0"));
    assert!(root.join("license").is_dir());
}

#[test]
fn rejects_unkeyed_and_foreign_entities() {
    let store = IndexStore::in_memory(HEAP);
    let licenses = indexer(&store, IndexKind::License);

    let unkeyed = License { uuid: "  ".into(), ..License::default() };
    assert!(matches!(licenses.add(&unkeyed), Err(Error::MissingKey(IndexKind::License))));
    assert!(matches!(licenses.update(&unkeyed), Err(Error::MissingKey(_))));
    assert!(matches!(licenses.remove(&unkeyed), Err(Error::MissingKey(_))));

    let project = Project::new("p1", "webapp");
    match licenses.add(&project) {
        Err(Error::KindMismatch { expected, found }) => {
            assert_eq!(expected, IndexKind::License);
            assert_eq!(found, IndexKind::Project);
        }
        other => panic!("expected kind mismatch, got {:?}", other),
    }
    assert_eq!(store.handle(IndexKind::License).unwrap().num_docs(), 0);
}

#[test]
fn kinds_do_not_share_documents() {
    let store = IndexStore::in_memory(HEAP);
    indexer(&store, IndexKind::License).add(&License::new("same", "MIT", "MIT License")).unwrap();
    indexer(&store, IndexKind::Project).add(&Project::new("same", "frontend")).unwrap();

    indexer(&store, IndexKind::Project).remove(&Project::new("same", "frontend")).unwrap();
    let license = store.handle(IndexKind::License).unwrap().get_by_key("same").unwrap();
    assert_eq!(license.and_then(|d| d.get("name").map(str::to_string)), Some("MIT License".to_string()));
    assert!(store.handle(IndexKind::Project).unwrap().get_by_key("same").unwrap().is_none());
}

#[test]
fn concurrent_updates_leave_one_document() {
    let store = IndexStore::in_memory(HEAP);
    let licenses = Arc::new(indexer(&store, IndexKind::License));
    let workers: Vec<_> = (0..8)
        .map(|i| {
            let licenses = Arc::clone(&licenses);
            thread::spawn(move || licenses.update(&License::new("race", "MIT", format!("MIT License rev {}", i))))
        })
        .collect();
    for w in workers { w.join().unwrap().expect("update"); }

    let handle = store.handle(IndexKind::License).unwrap();
    assert_eq!(handle.count_by_key("race").unwrap(), 1, "racing upserts never duplicate");
    let name = handle.get_by_key("race").unwrap().and_then(|d| d.get("name").map(str::to_string)).unwrap();
    assert!(name.starts_with("MIT License rev "));
}

#[test]
fn update_queued_behind_remove_of_same_key_wins() {
    for preexisting in [true, false] {
        let store = IndexStore::in_memory(HEAP);
        let licenses = Arc::new(indexer(&store, IndexKind::License));
        let handle = store.handle(IndexKind::License).unwrap();
        if preexisting {
            licenses.add(&License::new("k", "MIT", "MIT License")).unwrap();
        }

        let mut session = handle.open_writer().expect("writer");
        let updater = {
            let licenses = Arc::clone(&licenses);
            let entity = License::new("k", "MIT", "MIT License v2");
            thread::spawn(move || licenses.update(&entity))
        };
        // The update is parked on the kind lock until this session closes.
        session.delete_by_key("k").unwrap();
        session.commit().unwrap();
        session.close().unwrap();
        updater.join().unwrap().expect("update");

        assert_eq!(handle.count_by_key("k").unwrap(), 1, "preexisting = {}", preexisting);
        let doc = handle.get_by_key("k").unwrap().expect("indexed");
        assert_eq!(doc.get("name"), Some("MIT License v2"));
    }
}

#[test]
fn racing_update_and_remove_of_same_key_never_duplicate() {
    for round in 0..20 {
        let store = IndexStore::in_memory(HEAP);
        let licenses = Arc::new(indexer(&store, IndexKind::License));
        let key = format!("k{}", round);
        licenses.add(&License::new(key.clone(), "MIT", "MIT License")).unwrap();

        let updater = {
            let licenses = Arc::clone(&licenses);
            let entity = License::new(key.clone(), "MIT", "MIT License v2");
            thread::spawn(move || licenses.update(&entity))
        };
        let remover = {
            let licenses = Arc::clone(&licenses);
            let entity = License { uuid: key.clone(), ..License::default() };
            thread::spawn(move || licenses.remove(&entity))
        };
        updater.join().unwrap().unwrap();
        remover.join().unwrap().unwrap();

        let handle = store.handle(IndexKind::License).unwrap();
        match handle.count_by_key(&key).unwrap() {
            0 => {}
            1 => {
                let doc = handle.get_by_key(&key).unwrap().expect("indexed");
                assert_eq!(doc.get("name"), Some("MIT License v2"), "round {}: old state never resurfaces", round);
            }
            n => panic!("round {}: {} documents for one key", round, n),
        }
    }
}

#[test]
fn dropped_session_discards_and_releases() {
    let store = IndexStore::in_memory(HEAP);
    let handle = store.handle(IndexKind::License).unwrap();
    {
        let mut session = handle.open_writer().expect("writer");
        session.add_document(&License::new("tmp", "MIT", "MIT License").to_document()).unwrap();
    }
    assert_eq!(handle.num_docs(), 0);

    let mut session = handle.open_writer().expect("lock released after drop");
    session.add_document(&License::new("kept", "MIT", "MIT License").to_document()).unwrap();
    session.commit().unwrap();
    session.close().unwrap();
    assert_eq!(handle.count_by_key("kept").unwrap(), 1);
    assert!(handle.get_by_key("tmp").unwrap().is_none());
}

#[test]
fn search_over_license_fields() {
    let store = IndexStore::in_memory(HEAP);
    let licenses = indexer(&store, IndexKind::License);
    licenses.add(&License::new("a", "Apache-2.0", "Apache License 2.0")).unwrap();
    licenses.add(&License::new("m", "MIT", "MIT License")).unwrap();
    licenses.add(&License::new("g", "GPL-3.0-only", "GNU General Public License v3.0 only")).unwrap();

    let searcher = TextSearcher::new(store.handle(IndexKind::License).unwrap());
    let hits = searcher.search("apache", 10).expect("search");
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].id, "a");

    let hits = searcher.search("license", 10).expect("search");
    assert_eq!(hits.len(), 3, "every name carries the word");
    for pair in hits.windows(2) { assert!(pair[0].score >= pair[1].score); }

    let docs = searcher.search_documents("mit", 10).expect("search");
    assert_eq!(docs.len(), 1);
    assert_eq!(docs[0].1.get("licenseid"), Some("MIT"));
    assert!(searcher.search("mit", 0).unwrap().is_empty());
}

#[test]
fn invalid_query_is_an_operation_error() {
    let store = IndexStore::in_memory(HEAP);
    let searcher = TextSearcher::new(store.handle(IndexKind::License).unwrap());
    assert!(matches!(searcher.search("name:(", 10), Err(Error::Operation(_))));
}
