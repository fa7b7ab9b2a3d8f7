//! End-to-end workflows through the public engine API: the lifecycles a
//! shell user actually drives, across handles and reopen boundaries.

use engine::{Cask, Error, Options};
use tempfile::tempdir;

fn writable() -> Options {
    Options::writable()
}

#[test]
fn full_session_write_merge_reopen_read() {
    let dir = tempdir().unwrap();

    // Session 1: write, overwrite, delete, compact, close.
    {
        let mut db = Cask::open(dir.path(), writable()).unwrap();
        for i in 0..100u32 {
            db.put(&format!("user:{i:03}"), format!("record {i}").as_bytes())
                .unwrap();
        }
        db.sync().unwrap();

        for i in 0..50u32 {
            db.put(&format!("user:{i:03}"), format!("record {i} v2").as_bytes())
                .unwrap();
        }
        for i in 90..100u32 {
            db.delete(&format!("user:{i:03}")).unwrap();
        }
        db.merge().unwrap();
        db.close().unwrap();
    }

    // Session 2: read everything back through a fresh handle.
    {
        let mut db = Cask::open(dir.path(), Options::read_only()).unwrap();
        assert_eq!(db.key_count(), 90);

        assert_eq!(db.get("user:000").unwrap(), b"record 0 v2");
        assert_eq!(db.get("user:049").unwrap(), b"record 49 v2");
        assert_eq!(db.get("user:050").unwrap(), b"record 50");
        assert_eq!(db.get("user:089").unwrap(), b"record 89");
        assert!(matches!(db.get("user:095"), Err(Error::KeyNotFound(_))));

        let keys = db.list_keys();
        assert_eq!(keys.len(), 90);
        assert!(keys.windows(2).all(|w| w[0] < w[1]), "keys must be sorted");

        db.close().unwrap();
    }
}

#[test]
fn writer_and_readers_alternate_on_one_directory() {
    let dir = tempdir().unwrap();

    {
        let mut db = Cask::open(dir.path(), writable()).unwrap();
        db.put("shared", b"state").unwrap();
        db.close().unwrap();
    }

    // Two concurrent readers.
    {
        let mut r1 = Cask::open(dir.path(), Options::read_only()).unwrap();
        let mut r2 = Cask::open(dir.path(), Options::read_only()).unwrap();
        assert_eq!(r1.get("shared").unwrap(), b"state");
        assert_eq!(r2.get("shared").unwrap(), b"state");

        // While readers hold the directory, a writer must be refused.
        assert!(matches!(
            Cask::open(dir.path(), writable()),
            Err(Error::ReaderWriterConflict(_))
        ));

        r1.close().unwrap();
        r2.close().unwrap();
    }

    // Readers gone: the writer gets in again.
    let mut db = Cask::open(dir.path(), writable()).unwrap();
    db.put("shared", b"updated").unwrap();
    assert_eq!(db.get("shared").unwrap(), b"updated");
    db.close().unwrap();
}

#[test]
fn fold_accumulates_over_a_reopened_store() {
    let dir = tempdir().unwrap();

    {
        let mut db = Cask::open(dir.path(), writable()).unwrap();
        for i in 1..=10u64 {
            let s = i.to_string();
            db.put(&s, s.as_bytes()).unwrap();
        }
        db.close().unwrap();
    }

    let mut db = Cask::open(dir.path(), Options::read_only()).unwrap();
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
    db.close().unwrap();
}

#[test]
fn sync_on_write_store_needs_no_explicit_sync() {
    let dir = tempdir().unwrap();

    {
        let mut db = Cask::open(
            dir.path(),
            Options {
                sync_on_write: true,
                ..Options::writable()
            },
        )
        .unwrap();
        db.put("k", b"v").unwrap();
        assert_eq!(db.pending_count(), 0);
        db.close().unwrap();
    }

    let db = Cask::open(dir.path(), Options::read_only()).unwrap();
    assert_eq!(db.get("k").unwrap(), b"v");
}
