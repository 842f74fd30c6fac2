//! Integration tests for the SQLite-backed take store.
//!
//! These exercise the public store API end to end against a real database
//! file in a temporary directory, including persistence across reopens.

use tempfile::TempDir;
use vrec::store::{KeyValueStore, SqliteStore, TakeStore};

fn open_store(dir: &TempDir) -> TakeStore {
    let kv = SqliteStore::new(dir.path()).unwrap();
    TakeStore::new(Box::new(kv), dir.path().join("takes")).unwrap()
}

#[test]
fn sqlite_store_persists_across_reopens() {
    let dir = TempDir::new().unwrap();

    let saved = {
        let mut store = open_store(&dir);
        store.save(&[100i16, -100, 200], 16000).unwrap()
    };

    // A fresh store over the same directory sees the take
    let mut store = open_store(&dir);
    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, saved.id);
    assert_eq!(listed[0].audio_ref, saved.audio_ref);
}

#[test]
fn full_lifecycle_against_sqlite() {
    let dir = TempDir::new().unwrap();
    let mut store = open_store(&dir);

    let saved = store.save(&[1i16, 2, 3], 44100).unwrap();
    assert!(saved.id.starts_with("recording-"));
    assert!(std::path::Path::new(&saved.audio_ref).exists());

    let renamed = store
        .rename(&saved.id, "morning-take")
        .unwrap()
        .expect("take existed");
    assert_eq!(renamed.id, "recording-morning-take");

    let resolved = store.resolve("morning-take").unwrap().unwrap();
    assert_eq!(resolved.audio_ref, saved.audio_ref);

    store.delete(&renamed.id).unwrap();
    assert!(store.list().unwrap().is_empty());
    assert!(!std::path::Path::new(&saved.audio_ref).exists());
}

#[test]
fn rename_survives_reopen() {
    let dir = TempDir::new().unwrap();

    {
        let mut store = open_store(&dir);
        let saved = store.save(&[5i16; 64], 16000).unwrap();
        store.rename(&saved.id, "kept-name").unwrap();
    }

    let mut store = open_store(&dir);
    let listed = store.list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].display_name, "kept-name");
}

#[test]
fn sqlite_kv_roundtrip_and_upsert() {
    let dir = TempDir::new().unwrap();
    let mut kv = SqliteStore::new(dir.path()).unwrap();

    assert_eq!(kv.get("recording-x").unwrap(), None);
    kv.set("recording-x", "/tmp/a.wav").unwrap();
    kv.set("recording-x", "/tmp/b.wav").unwrap();
    assert_eq!(kv.get("recording-x").unwrap().as_deref(), Some("/tmp/b.wav"));

    kv.remove("recording-x").unwrap();
    kv.remove("recording-x").unwrap();
    assert_eq!(kv.get("recording-x").unwrap(), None);
    assert!(kv.keys().unwrap().is_empty());
}

#[test]
fn takes_from_different_stores_do_not_interfere() {
    let dir_a = TempDir::new().unwrap();
    let dir_b = TempDir::new().unwrap();

    let mut store_a = open_store(&dir_a);
    let mut store_b = open_store(&dir_b);

    store_a.save(&[1i16], 16000).unwrap();
    assert_eq!(store_a.list().unwrap().len(), 1);
    assert!(store_b.list().unwrap().is_empty());
}
