use crate::{Cask, Options};
use std::path::Path;

pub fn open_rw(dir: &Path) -> Cask {
    Cask::open(dir, Options::writable()).unwrap()
}

pub fn open_ro(dir: &Path) -> Cask {
    Cask::open(dir, Options::read_only()).unwrap()
}

/// Writable options with tight thresholds so tests exercise flush/rotation.
pub fn tuned(pending_max: usize, segment_max_bytes: u64) -> Options {
    Options {
        pending_max,
        segment_max_bytes,
        ..Options::writable()
    }
}

/// Closed (numeric) segment count.
pub fn numeric_segments(dir: &Path) -> usize {
    segment::list_segment_ids(dir).unwrap().len()
}

/// All segments: closed ones plus the active file if present.
pub fn total_segments(dir: &Path) -> usize {
    let active = dir.join(segment::ACTIVE_FILE).exists() as usize;
    numeric_segments(dir) + active
}
