use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Fixed name of the append target.
pub const ACTIVE_FILE: &str = "activeFile";

/// Fixed name of the keydir snapshot.
pub const HINT_FILE: &str = "hintFile";

/// Writer lock sentinel: a zero-byte file whose presence marks a live writer.
pub const WRITE_LOCK_FILE: &str = "db.lck";

/// Reader count sentinel: a small file holding an ASCII decimal count.
pub const READER_LOCK_FILE: &str = ".readerLock";

pub fn active_path(dir: &Path) -> PathBuf {
    dir.join(ACTIVE_FILE)
}

pub fn hint_path(dir: &Path) -> PathBuf {
    dir.join(HINT_FILE)
}

/// Path of the closed segment with the given id (decimal ASCII name).
pub fn segment_path(dir: &Path, file_id: u64) -> PathBuf {
    dir.join(file_id.to_string())
}

/// Parses a directory entry name as a segment id. Only all-digit names
/// qualify; everything else (active file, hint file, sentinels, tmp files)
/// is not a closed segment.
pub fn parse_segment_name(name: &str) -> Option<u64> {
    if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    name.parse().ok()
}

/// Ids of all closed segments in the directory, sorted ascending (oldest
/// first, since ids are creation timestamps).
pub fn list_segment_ids(dir: &Path) -> io::Result<Vec<u64>> {
    let mut ids = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if let Some(name) = entry.file_name().to_str() {
            if let Some(id) = parse_segment_name(name) {
                ids.push(id);
            }
        }
    }
    ids.sort_unstable();
    Ok(ids)
}

/// Wall-clock nanoseconds since the Unix epoch; the unit file ids and record
/// timestamps are expressed in.
pub fn now_nanos() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(0)
}

/// Allocates a file id no existing segment in `dir` is using. Ids are
/// wall-clock nanoseconds, bumped past any collision from a coarse clock.
pub fn fresh_file_id(dir: &Path) -> u64 {
    let mut id = now_nanos();
    while segment_path(dir, id).exists() {
        id += 1;
    }
    id
}
