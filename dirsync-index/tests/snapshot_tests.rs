use dirsync_index::{FileRecord, IndexSnapshot};
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn record(mtime_ns: u64, size: u64) -> FileRecord {
    FileRecord { mtime_ns, size }
}

#[test]
fn store_then_load_round_trips() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("index.json");

    let mut snapshot = IndexSnapshot::new();
    snapshot.insert("/home/user/a.txt".into(), record(1_700_000_000_000_000_000, 100));
    snapshot.insert("/home/user/b.txt".into(), record(1_700_000_000_000_000_001, 0));

    snapshot.store(&path).unwrap();
    let loaded = IndexSnapshot::load(&path).unwrap();
    assert_eq!(loaded, snapshot);
}

#[test]
fn missing_file_loads_as_empty() {
    let dir = TempDir::new().unwrap();
    let loaded = IndexSnapshot::load(&dir.path().join("absent.json")).unwrap();
    assert!(loaded.is_empty());
}

#[test]
fn store_overwrites_previous_snapshot() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("index.json");

    let mut first = IndexSnapshot::new();
    first.insert("/a".into(), record(1, 1));
    first.store(&path).unwrap();

    let mut second = IndexSnapshot::new();
    second.insert("/b".into(), record(2, 2));
    second.store(&path).unwrap();

    let loaded = IndexSnapshot::load(&path).unwrap();
    assert_eq!(loaded, second);
    assert!(!loaded.contains("/a"));
}

#[test]
fn store_creates_parent_directories() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("state/nested/index.json");
    IndexSnapshot::new().store(&path).unwrap();
    assert!(path.is_file());
}

#[test]
fn merge_last_writer_wins_on_collision() {
    let mut base = IndexSnapshot::new();
    base.insert("/shared".into(), record(1, 1));

    let mut other = IndexSnapshot::new();
    other.insert("/shared".into(), record(2, 2));

    base.merge(other);
    assert_eq!(base.get("/shared"), Some(&record(2, 2)));
}

#[test]
fn corrupt_snapshot_is_an_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("index.json");
    std::fs::write(&path, b"not json").unwrap();
    assert!(IndexSnapshot::load(&path).is_err());
}
