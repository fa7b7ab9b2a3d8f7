use segment::SegmentError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Error kinds surfaced by the engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The key is absent (or resolved to a pending tombstone).
    #[error("key `{0}` not found")]
    KeyNotFound(String),

    /// Read-only open of a directory that does not exist.
    #[error("no such database directory {0}")]
    DirectoryNotFound(PathBuf),

    /// A mutating operation on a read-only (or already closed) handle.
    #[error("writing permission denied in directory {0}")]
    PermissionDenied(PathBuf),

    /// Another writer holds the directory.
    #[error("directory {0} is locked by another writer")]
    DirectoryLocked(PathBuf),

    /// Write access was requested while readers hold the directory.
    #[error("directory {0} is held open by readers")]
    ReaderWriterConflict(PathBuf),

    /// A data record failed CRC validation during a segment scan.
    #[error("corrupt record in {0}")]
    Corruption(PathBuf),

    /// The key is empty, contains a newline, or exceeds the size cap.
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// The value exceeds the size cap.
    #[error("value too large: {0} bytes")]
    ValueTooLarge(usize),

    /// An underlying filesystem failure, surfaced as-is.
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// A CaskDB engine result.
pub type Result<T> = std::result::Result<T, Error>;

impl From<SegmentError> for Error {
    fn from(e: SegmentError) -> Self {
        match e {
            SegmentError::Io(e) => Error::Io(e),
            SegmentError::Corrupt(path) => Error::Corruption(path),
        }
    }
}
