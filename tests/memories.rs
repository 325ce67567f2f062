//! Memory collection persistence through the public store API.

use arix::error::{MemoryError, StoreError};
use arix::memory::{FileStore, InMemoryStore, Memory, MemoryDraft, MemoryId, MemoryStore, PendingLoads};
use std::fs;

const KEY: &str = "christmas-memories";

fn memory(id: u64, name: &str) -> Memory {
    Memory {
        id: MemoryId::from(id),
        name: name.to_string(),
        photo: format!("data:image/png;base64,{id}"),
        music: None,
    }
}

#[test]
fn test_add_then_delete_restores_collection() {
    let mut store = MemoryStore::open(InMemoryStore::new(), KEY);
    assert!(store.add(memory(1, "first")).unwrap().is_saved());
    assert!(store.add(memory(2, "second")).unwrap().is_saved());
    let before = store.memories().to_vec();

    assert!(store.add(memory(3, "third")).unwrap().is_saved());
    assert_eq!(store.memories()[0].name, "third");
    assert!(store.delete(&MemoryId::from(3)).is_saved());
    assert_eq!(store.memories(), before.as_slice());
}

#[test]
fn test_export_import_round_trip() {
    let mut source = MemoryStore::open(InMemoryStore::new(), KEY);
    let _ = source.add(memory(10, "tree"));
    let _ = source.add(Memory {
        music: Some("data:audio/mpeg;base64,AAAA".into()),
        ..memory(11, "carols")
    });
    let exported = source.export_json().unwrap();

    let mut target = MemoryStore::open(InMemoryStore::new(), KEY);
    let _ = target.add(memory(99, "will be replaced"));
    assert!(target.import_json(&exported).unwrap().is_saved());
    assert_eq!(target.memories(), source.memories());
}

#[test]
fn test_rejected_import_keeps_collection() {
    let mut store = MemoryStore::open(InMemoryStore::new(), KEY);
    let _ = store.add(memory(1, "kept"));
    let revision = store.revision();

    for bad in ["not json", r#"{"id": 1}"#, r#"[{"id": 1}]"#] {
        let err = store.import_json(bad).unwrap_err();
        assert!(matches!(err, MemoryError::InvalidImport(_)), "{bad}: {err}");
    }
    assert_eq!(store.len(), 1);
    assert_eq!(store.revision(), revision);
}

#[test]
fn test_duplicate_ids_never_enter_collection() {
    let mut store = MemoryStore::open(InMemoryStore::new(), KEY);
    let _ = store.add(memory(7, "original"));
    assert!(matches!(
        store.add(memory(7, "copy")),
        Err(MemoryError::DuplicateId(_))
    ));

    let json = r#"[{"id": 1, "name": "a", "photo": "p"}, {"id": 1, "name": "b", "photo": "p"}]"#;
    assert!(matches!(store.import_json(json), Err(MemoryError::InvalidImport(_))));

    assert_eq!(store.len(), 1);
    assert_eq!(store.memories()[0].name, "original");
    assert!(store.delete(&MemoryId::from(7)).is_saved());
    assert!(store.get(&MemoryId::from(7)).is_none());
}

#[test]
fn test_string_ids_survive_import() {
    let json = r#"[
        {"id": "abc", "name": "text id", "photo": "p"},
        {"id": 1734567890123, "name": "number id", "photo": "p", "music": ""}
    ]"#;
    let mut store = MemoryStore::open(InMemoryStore::new(), KEY);
    let _ = store.import_json(json).unwrap();
    assert!(store.get(&MemoryId::from("abc")).is_some());
    assert!(store.get(&MemoryId::parse("1734567890123")).is_some());
    assert!(store.memories().iter().all(|m| m.music.is_none()));

    let exported = store.export_json().unwrap();
    assert!(exported.contains(r#""id": "abc""#));
    assert!(exported.contains(r#""id": 1734567890123"#));
}

#[test]
fn test_quota_failure_keeps_memory_for_session() {
    let mut store = MemoryStore::open(InMemoryStore::with_quota(64), KEY);
    let big = Memory {
        photo: format!("data:image/png;base64,{}", "A".repeat(256)),
        ..memory(1, "too big")
    };
    let persisted = store.add(big).unwrap();
    assert!(matches!(persisted.error(), Some(StoreError::Quota { limit: 64, .. })));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_file_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let mut store = MemoryStore::open(FileStore::new(dir.path()), KEY);
        let _ = store.add(memory(1, "one"));
        let _ = store.add(memory(2, "two"));
        let _ = store.delete(&MemoryId::from(1));
    }
    let store = MemoryStore::open(FileStore::new(dir.path()), KEY);
    assert_eq!(store.len(), 1);
    assert_eq!(store.memories()[0].name, "two");
    assert!(dir.path().join(format!("{KEY}.json")).exists());
}

#[test]
fn test_corrupt_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join(format!("{KEY}.json")), "{ definitely not an array").unwrap();
    let store = MemoryStore::open(FileStore::new(dir.path()), KEY);
    assert!(store.is_empty());
}

#[test]
fn test_pending_load_lands_whole() {
    let dir = tempfile::tempdir().unwrap();
    let photo = dir.path().join("snow.png");
    let song = dir.path().join("bells.mp3");
    fs::write(&photo, [0x89, b'P', b'N', b'G']).unwrap();
    fs::write(&song, b"ID3").unwrap();

    let mut store = MemoryStore::open(InMemoryStore::new(), KEY);
    let mut pending = PendingLoads::new();
    pending
        .submit(MemoryDraft::new("Snow", &photo).with_music(&song), MemoryId::from(5))
        .unwrap();

    let mut landed = Vec::new();
    for _ in 0..500 {
        landed.extend(store.apply_pending(&mut pending));
        if pending.is_empty() {
            break;
        }
        std::thread::sleep(std::time::Duration::from_millis(2));
    }
    assert_eq!(landed.len(), 1);
    assert!(landed[0].as_ref().is_ok_and(|p| p.is_saved()));

    let memory = store.get(&MemoryId::from(5)).unwrap();
    assert!(memory.photo.starts_with("data:image/png;base64,"));
    assert!(memory
        .music
        .as_deref()
        .is_some_and(|m| m.starts_with("data:audio/mpeg;base64,")));
}

#[test]
fn test_draft_without_name_is_rejected() {
    let mut pending = PendingLoads::new();
    let err = pending
        .submit(MemoryDraft::new("  ", "photo.png"), MemoryId::from(1))
        .unwrap_err();
    assert!(matches!(err, MemoryError::MissingName));
    assert!(pending.is_empty());
}
