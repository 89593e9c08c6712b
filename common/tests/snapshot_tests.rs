use common::index::PageIndex;
use common::snapshot::{load_or_default, save};
use std::fs;
use tempfile::tempdir;

fn sample_index() -> PageIndex {
    let mut idx = PageIndex::new();
    idx.ingest(
        "http://a",
        "Alpha",
        "cats are great animals",
        &["http://b".to_string(), "http://c".to_string()],
    );
    idx.ingest("http://b", "Beta", "dogs bark", &["http://a".to_string()]);
    idx
}

#[test]
fn save_then_load_reproduces_index() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("replica.snapshot");

    let original = sample_index();
    save(&original, &path).unwrap();
    let restored = load_or_default(&path);

    assert_eq!(restored, original);
    assert_eq!(restored.len(), 2);
    assert_eq!(restored.incoming_links("http://b"), vec!["http://a".to_string()]);
    let hits = restored.search(&["cats".to_string()], 1);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].url, "http://a");
}

#[test]
fn save_overwrites_previous_snapshot_atomically() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("replica.snapshot");

    save(&sample_index(), &path).unwrap();
    let mut bigger = sample_index();
    bigger.ingest("http://d", "Delta", "more words", &[]);
    save(&bigger, &path).unwrap();

    assert_eq!(load_or_default(&path).len(), 3);
    // No temp file left behind after a completed save.
    assert!(!path.with_file_name("replica.snapshot.tmp").exists());
}

#[test]
fn missing_snapshot_starts_empty() {
    let dir = tempdir().unwrap();
    let idx = load_or_default(&dir.path().join("never-written"));
    assert!(idx.is_empty());
}

#[test]
fn truncated_snapshot_is_discarded_not_fatal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("replica.snapshot");

    save(&sample_index(), &path).unwrap();
    let bytes = fs::read(&path).unwrap();
    fs::write(&path, &bytes[..bytes.len() / 2]).unwrap();

    let idx = load_or_default(&path);
    assert!(idx.is_empty());
    assert!(!path.exists(), "corrupt file should be removed");
}

#[test]
fn garbage_snapshot_is_discarded_not_fatal() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("replica.snapshot");
    fs::write(&path, b"not a snapshot at all").unwrap();

    let idx = load_or_default(&path);
    assert!(idx.is_empty());
    assert!(!path.exists());
}
