use super::*;
use record::DataRecord;
use std::fs;
use tempfile::tempdir;

fn rec(stamp: u64, key: &str, value: &[u8]) -> DataRecord {
    DataRecord::new(stamp, key.to_string(), value.to_vec())
}

// -------------------- Naming & listing --------------------

#[test]
fn parse_segment_name_accepts_only_digits() {
    assert_eq!(parse_segment_name("1708600000000"), Some(1708600000000));
    assert_eq!(parse_segment_name("0"), Some(0));
    assert_eq!(parse_segment_name(ACTIVE_FILE), None);
    assert_eq!(parse_segment_name(HINT_FILE), None);
    assert_eq!(parse_segment_name(WRITE_LOCK_FILE), None);
    assert_eq!(parse_segment_name("123.tmp"), None);
    assert_eq!(parse_segment_name(""), None);
}

#[test]
fn list_segment_ids_sorted_and_filtered() {
    let dir = tempdir().unwrap();
    for name in ["300", "100", "200", ACTIVE_FILE, HINT_FILE, "55.tmp"] {
        fs::write(dir.path().join(name), b"").unwrap();
    }

    let ids = list_segment_ids(dir.path()).unwrap();
    assert_eq!(ids, vec![100, 200, 300]);
}

#[test]
fn fresh_file_id_skips_existing_names() {
    let dir = tempdir().unwrap();
    let id = fresh_file_id(dir.path());
    fs::write(segment_path(dir.path(), id), b"").unwrap();

    // A second allocation in the same nanosecond must not collide.
    let next = fresh_file_id(dir.path());
    assert_ne!(next, id);
    assert!(!segment_path(dir.path(), next).exists());
}

// -------------------- Active segment appends --------------------

#[test]
fn append_then_read_value() {
    let dir = tempdir().unwrap();
    let active_id = 42;

    let mut active = ActiveSegment::open(dir.path()).unwrap();
    let pos1 = active.append(&rec(1, "Name", b"Eslam")).unwrap();
    let pos2 = active.append(&rec(2, "uni", b"MU")).unwrap();
    active.sync().unwrap();

    assert_eq!(pos1, 0);
    assert_eq!(pos2, rec(1, "Name", b"Eslam").encoded_len());

    let v1 = read_value(dir.path(), active_id, active_id, "Name".len(), pos1, 5).unwrap();
    let v2 = read_value(dir.path(), active_id, active_id, "uni".len(), pos2, 2).unwrap();
    assert_eq!(v1, b"Eslam");
    assert_eq!(v2, b"MU");
}

#[test]
fn open_resumes_at_current_size() {
    let dir = tempdir().unwrap();

    let first_len;
    {
        let mut active = ActiveSegment::open(dir.path()).unwrap();
        active.append(&rec(1, "a", b"1")).unwrap();
        first_len = active.len();
    }

    let active = ActiveSegment::open(dir.path()).unwrap();
    assert_eq!(active.len(), first_len);
    assert!(!active.is_empty());
}

// -------------------- Rotation --------------------

#[test]
fn rotate_renames_and_resets() {
    let dir = tempdir().unwrap();
    let retired_id = 7;

    let mut active = ActiveSegment::open(dir.path()).unwrap();
    let pos = active.append(&rec(1, "k", b"v")).unwrap();
    active.rotate(retired_id).unwrap();

    assert!(segment_path(dir.path(), retired_id).exists());
    assert!(active.is_empty());

    // Records keep resolving through their (now numeric) file id.
    let v = read_value(dir.path(), retired_id, 999, 1, pos, 1).unwrap();
    assert_eq!(v, b"v");

    // And the fresh active file accepts appends from offset zero.
    let pos = active.append(&rec(2, "k2", b"v2")).unwrap();
    assert_eq!(pos, 0);
}

#[test]
fn retire_active_renames_nonempty() {
    let dir = tempdir().unwrap();
    {
        let mut active = ActiveSegment::open(dir.path()).unwrap();
        active.append(&rec(1, "k", b"v")).unwrap();
    }

    retire_active(dir.path(), 11).unwrap();
    assert!(!active_path(dir.path()).exists());
    assert!(segment_path(dir.path(), 11).exists());
}

#[test]
fn retire_active_removes_empty_and_tolerates_missing() {
    let dir = tempdir().unwrap();

    // Missing: no-op.
    retire_active(dir.path(), 11).unwrap();

    // Empty: removed, not renamed.
    fs::write(active_path(dir.path()), b"").unwrap();
    retire_active(dir.path(), 11).unwrap();
    assert!(!active_path(dir.path()).exists());
    assert!(!segment_path(dir.path(), 11).exists());
}

// -------------------- Scanning --------------------

#[test]
fn scan_yields_records_with_offsets() {
    let dir = tempdir().unwrap();
    let mut active = ActiveSegment::open(dir.path()).unwrap();
    let a = rec(1, "a", b"1");
    let b = rec(2, "b", b"2");
    active.append(&a).unwrap();
    active.append(&b).unwrap();
    drop(active);

    let mut seen = Vec::new();
    scan(&active_path(dir.path()), |pos, r| seen.push((pos, r))).unwrap();
    assert_eq!(seen, vec![(0, a.clone()), (a.encoded_len(), b)]);
}

#[test]
fn scan_tolerates_truncated_tail() {
    let dir = tempdir().unwrap();
    let mut active = ActiveSegment::open(dir.path()).unwrap();
    active.append(&rec(1, "whole", b"record")).unwrap();
    drop(active);

    let path = active_path(dir.path());
    let mut data = fs::read(&path).unwrap();
    data.extend_from_slice(&[0x01, 0x02, 0x03]); // partial next record
    fs::write(&path, &data).unwrap();

    let mut count = 0;
    scan(&path, |_, _| count += 1).unwrap();
    assert_eq!(count, 1);
}

#[test]
fn scan_surfaces_corruption() {
    let dir = tempdir().unwrap();
    let mut active = ActiveSegment::open(dir.path()).unwrap();
    active.append(&rec(1, "key", b"value")).unwrap();
    active.append(&rec(2, "key2", b"value2")).unwrap();
    drop(active);

    let path = active_path(dir.path());
    let mut data = fs::read(&path).unwrap();
    data[25] ^= 0xFF; // flip a byte inside the first record's body
    fs::write(&path, &data).unwrap();

    let result = scan(&path, |_, _| {});
    assert!(matches!(result, Err(SegmentError::Corrupt(_))));
}
