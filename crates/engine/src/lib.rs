//! # Engine - CaskDB storage engine
//!
//! The central orchestrator that ties together the [`record`], [`keydir`],
//! and [`segment`] crates into a complete Bitcask-style key-value store.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                    CASK                       │
//! │                                               │
//! │ write.rs → pending buffer + keydir(pending)   │
//! │              |                                │
//! │              |  (buffer full / sync / close)  │
//! │              v                                │
//! │           sync() → append to activeFile       │
//! │              |      rotate at size threshold  │
//! │              v                                │
//! │           keydir entries become durable       │
//! │                                               │
//! │ read.rs  → pending buffer, else one seek      │
//! │            into the segment the keydir names  │
//! │                                               │
//! │ merge.rs → live values → compacted segment,   │
//! │            stale segments deleted, hint file  │
//! │            rewritten                          │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module        | Purpose                                                |
//! |---------------|--------------------------------------------------------|
//! | [`lib.rs`]    | `Cask` struct, open, close, accessors, `Debug`, `Drop` |
//! | [`recovery`]  | Keydir rebuild: hint fast path, full segment scan      |
//! | [`write`]     | `put()`, `delete()`, `sync()` (buffer drain, rotation) |
//! | [`read`]      | `get()`, `list_keys()`, `fold()`                       |
//! | [`merge`]     | Compaction with atomic tmp + rename swap               |
//! | [`hint`]      | Hint-file generation (atomic rewrite)                  |
//! | [`lock`]      | Writer lock / reader count sentinels                   |
//! | [`error`]     | Typed error kinds and the crate `Result` alias         |
//!
//! ## Access modes
//!
//! One directory is held by at most one writer **or** any number of readers,
//! coordinated through advisory sentinel files (`db.lck`, `.readerLock`).
//! A handle is single-threaded; no operation may run concurrently with
//! another on the same handle.
//!
//! ## Durability
//!
//! Puts and deletes are staged in memory and become durable at `sync()`:
//! when the pending buffer hits its soft maximum, on every write when
//! `sync_on_write` is set, and at `close()`. The active segment is fsynced
//! once per drain. Deletes append a tombstone record, so they survive a
//! crash once synced; recovery filters them back out.

mod error;
mod hint;
mod lock;
mod merge;
mod read;
mod recovery;
mod write;

pub use error::{Error, Result};
pub use record::TOMBSTONE;

use keydir::{Keydir, PendingBuffer};
use std::path::{Path, PathBuf};

/// Maximum allowed key size in bytes (64 KiB).
pub const MAX_KEY_SIZE: usize = 64 * 1024;
/// Maximum allowed value size in bytes (10 MiB).
pub const MAX_VALUE_SIZE: usize = 10 * 1024 * 1024;

/// Default soft maximum of the pending buffer, in entries.
pub const DEFAULT_PENDING_MAX: usize = 50;
/// Default rotation threshold for the active segment, in bytes.
pub const DEFAULT_SEGMENT_MAX_BYTES: u64 = 10 * 1024;

/// Access mode of a handle. Governs whether mutating operations are allowed
/// and which lock sentinel the handle takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    Read,
    Write,
}

/// Configuration for [`Cask::open`].
#[derive(Debug, Clone)]
pub struct Options {
    /// Access mode; defaults to `Read`.
    pub access: Access,
    /// When `true`, every put/delete flushes before returning.
    pub sync_on_write: bool,
    /// Soft maximum of the pending buffer; a put finding the buffer at this
    /// size flushes first.
    pub pending_max: usize,
    /// Active-segment size at which a flush step rotates. Small by default
    /// so tests exercise rotation; production callers raise it.
    pub segment_max_bytes: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            access: Access::Read,
            sync_on_write: false,
            pending_max: DEFAULT_PENDING_MAX,
            segment_max_bytes: DEFAULT_SEGMENT_MAX_BYTES,
        }
    }
}

impl Options {
    /// Read-only access with default tuning.
    pub fn read_only() -> Self {
        Self::default()
    }

    /// Exclusive write access with default tuning.
    pub fn writable() -> Self {
        Self {
            access: Access::Write,
            ..Self::default()
        }
    }
}

/// A handle on one database directory.
///
/// Holds the full in-memory index (keydir), the pending write buffer, and
/// the identity of the active segment. File descriptors are opened per
/// operation and released before it returns; the handle itself keeps none.
pub struct Cask {
    dir: PathBuf,
    opts: Options,
    keydir: Keydir,
    pending: PendingBuffer,
    /// Id the next flushed records will be indexed under. Reassigned on every
    /// rotation; reads matching this id target the fixed active filename.
    active_id: u64,
    created: bool,
    closed: bool,
}

impl Cask {
    /// Opens a database directory.
    ///
    /// Write access takes the exclusive writer lock (failing with
    /// [`Error::DirectoryLocked`] if another writer holds it and
    /// [`Error::ReaderWriterConflict`] if readers do) and creates the
    /// directory when missing. Read access increments the reader count and
    /// fails with [`Error::DirectoryNotFound`] on a missing directory.
    ///
    /// The keydir is rebuilt from the hint file when the previous session
    /// closed cleanly, otherwise by scanning every segment.
    pub fn open<P: AsRef<Path>>(dir: P, opts: Options) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();

        let mut created = false;
        if !dir.is_dir() {
            match opts.access {
                Access::Write => {
                    std::fs::create_dir_all(&dir)?;
                    created = true;
                }
                Access::Read => return Err(Error::DirectoryNotFound(dir)),
            }
        }

        match opts.access {
            Access::Write => {
                if lock::readers_present(&dir) {
                    return Err(Error::ReaderWriterConflict(dir));
                }
                lock::acquire_writer(&dir)?;
            }
            Access::Read => {
                if lock::writer_present(&dir) {
                    return Err(Error::DirectoryLocked(dir));
                }
                lock::add_reader(&dir)?;
            }
        }

        let active_id = segment::fresh_file_id(&dir);
        let mut cask = Self {
            dir,
            opts,
            keydir: Keydir::new(),
            pending: PendingBuffer::new(),
            active_id,
            created,
            closed: false,
        };

        if !created {
            if let Err(e) = cask.recover() {
                cask.abandon();
                return Err(e);
            }
        }
        Ok(cask)
    }

    /// True if this open created the directory (write access on a path that
    /// did not exist).
    #[must_use]
    pub fn created(&self) -> bool {
        self.created
    }

    /// The database directory this handle is bound to.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// The access mode the handle was opened with.
    #[must_use]
    pub fn access(&self) -> Access {
        self.opts.access
    }

    /// Number of live keys in the keydir.
    #[must_use]
    pub fn key_count(&self) -> usize {
        self.keydir.len()
    }

    /// Number of staged, not-yet-durable writes.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Closes the handle. Idempotent; a second call is a no-op.
    ///
    /// Write handles flush the pending buffer, retire the active segment to
    /// its numeric name, rewrite the hint file, and release the writer lock.
    /// Read handles decrement the reader count, removing the sentinel at
    /// zero.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        match self.opts.access {
            Access::Write => {
                self.sync()?;
                segment::retire_active(&self.dir, self.active_id)?;
                self.write_hint()?;
                lock::release_writer(&self.dir)?;
            }
            Access::Read => lock::remove_reader(&self.dir)?,
        }
        self.closed = true;
        Ok(())
    }

    /// Releases this handle's lock sentinel without flushing. Used when open
    /// itself fails partway, so the sentinel never leaks.
    fn abandon(&mut self) {
        match self.opts.access {
            Access::Write => {
                let _ = lock::release_writer(&self.dir);
            }
            Access::Read => {
                let _ = lock::remove_reader(&self.dir);
            }
        }
        self.closed = true;
    }

    pub(crate) fn check_writable(&self) -> Result<()> {
        if self.closed || self.opts.access != Access::Write {
            return Err(Error::PermissionDenied(self.dir.clone()));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Cask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cask")
            .field("dir", &self.dir)
            .field("access", &self.opts.access)
            .field("sync_on_write", &self.opts.sync_on_write)
            .field("active_id", &self.active_id)
            .field("keys", &self.keydir.len())
            .field("pending", &self.pending.len())
            .field("closed", &self.closed)
            .finish()
    }
}

/// Best-effort close on drop.
///
/// Errors are ignored because `Drop` cannot propagate them; a write handle
/// that fails here leaves its segments intact and the next open rebuilds the
/// keydir by scanning.
impl Drop for Cask {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[cfg(test)]
mod tests;
