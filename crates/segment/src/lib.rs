//! # Segment — CaskDB segment file management
//!
//! Owns the on-disk layout of a database directory:
//!
//! ```text
//! <dir>/
//!   activeFile        the single append target (fixed name)
//!   1708600000000123  closed segments, named by decimal nanosecond id
//!   1708600000487766
//!   hintFile          keydir snapshot written at close/merge
//!   db.lck            writer lock sentinel (zero bytes)
//!   .readerLock       reader count sentinel (ASCII decimal)
//! ```
//!
//! Segments are *append-once, read-many*: records are only ever added to the
//! end of the active file, and once the active file is rotated to its numeric
//! name it is never modified again (merge replaces segments wholesale).
//!
//! Rotation renames the active file to the decimal form of the id its
//! records were indexed under, then starts a fresh active file — so keydir
//! entries recorded before the rotation keep resolving, first to the fixed
//! active name and afterwards to the numeric one.

mod active;
mod layout;
mod read;

pub use active::{retire_active, ActiveSegment};
pub use layout::{
    active_path, fresh_file_id, hint_path, list_segment_ids, now_nanos, parse_segment_name,
    segment_path, ACTIVE_FILE, HINT_FILE, READER_LOCK_FILE, WRITE_LOCK_FILE,
};
pub use read::{read_value, scan};

use std::path::PathBuf;
use thiserror::Error;

/// Errors from segment file operations.
#[derive(Debug, Error)]
pub enum SegmentError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A record in the named segment failed CRC validation.
    #[error("corrupt record in segment {0}")]
    Corrupt(PathBuf),
}

#[cfg(test)]
mod tests;
