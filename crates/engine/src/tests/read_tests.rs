use super::helpers::*;
use crate::*;
use tempfile::tempdir;

#[test]
fn get_missing_key() {
    let dir = tempdir().unwrap();
    let db = open_rw(dir.path());

    assert!(matches!(db.get("nope"), Err(Error::KeyNotFound(_))));
}

#[test]
fn get_reads_pending_then_durable() {
    let dir = tempdir().unwrap();
    let mut db = open_rw(dir.path());

    db.put("k", b"old").unwrap();
    db.sync().unwrap();
    db.put("k", b"new").unwrap();

    // Pending write supersedes the durable record.
    assert_eq!(db.get("k").unwrap(), b"new");

    db.sync().unwrap();
    assert_eq!(db.get("k").unwrap(), b"new");
}

// --------------------- list_keys ---------------------

#[test]
fn list_keys_sorted_ascending() {
    let dir = tempdir().unwrap();
    let mut db = open_rw(dir.path());

    for key in ["zebra", "apple", "mango"] {
        db.put(key, b"v").unwrap();
    }

    assert_eq!(db.list_keys(), vec!["apple", "mango", "zebra"]);
}

#[test]
fn list_keys_spans_pending_and_durable() {
    let dir = tempdir().unwrap();
    let mut db = open_rw(dir.path());

    db.put("durable", b"v").unwrap();
    db.sync().unwrap();
    db.put("pending", b"v").unwrap();

    assert_eq!(db.list_keys(), vec!["durable", "pending"]);
}

#[test]
fn list_keys_excludes_pending_deletes() {
    let dir = tempdir().unwrap();
    let mut db = open_rw(dir.path());

    db.put("keep", b"v").unwrap();
    db.put("gone", b"v").unwrap();
    db.sync().unwrap();
    db.delete("gone").unwrap();

    // The tombstone is still pending, but the key is no longer live.
    assert_eq!(db.list_keys(), vec!["keep"]);

    db.sync().unwrap();
    assert_eq!(db.list_keys(), vec!["keep"]);
}

// --------------------- fold ---------------------

#[test]
fn fold_sums_keys_and_values() {
    let dir = tempdir().unwrap();
    let mut db = open_rw(dir.path());

    for i in 1..=10u64 {
        let s = i.to_string();
        db.put(&s, s.as_bytes()).unwrap();
    }

    let sum = db
        .fold(
            |key, value, acc: u64| {
                let k: u64 = key.parse().unwrap();
                let v: u64 = std::str::from_utf8(value).unwrap().parse().unwrap();
                acc + k + v
            },
            0,
        )
        .unwrap();
    assert_eq!(sum, 110);
}

#[test]
fn fold_skips_pending_deletes() {
    let dir = tempdir().unwrap();
    let mut db = open_rw(dir.path());

    db.put("a", b"1").unwrap();
    db.put("b", b"2").unwrap();
    db.sync().unwrap();
    db.delete("b").unwrap();

    let count = db.fold(|_, _, acc: usize| acc + 1, 0).unwrap();
    assert_eq!(count, 1);
}

#[test]
fn fold_over_empty_store_returns_seed() {
    let dir = tempdir().unwrap();
    let db = open_rw(dir.path());

    let acc = db.fold(|_, _, acc: i32| acc + 1, 7).unwrap();
    assert_eq!(acc, 7);
}
