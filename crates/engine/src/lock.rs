//! Lock sentinels: a zero-byte `db.lck` marks a live writer, an ASCII
//! decimal count in `.readerLock` tracks concurrent readers.
//!
//! Coordination is advisory — no kernel-level file locks — but the writer
//! sentinel is taken with a create-exclusive open so two writers racing for
//! the same directory cannot both win.

use crate::error::{Error, Result};
use segment::{READER_LOCK_FILE, WRITE_LOCK_FILE};
use std::fs::{self, OpenOptions};
use std::io::ErrorKind;
use std::path::Path;

pub(crate) fn writer_present(dir: &Path) -> bool {
    dir.join(WRITE_LOCK_FILE).exists()
}

pub(crate) fn readers_present(dir: &Path) -> bool {
    dir.join(READER_LOCK_FILE).exists()
}

/// Takes the writer lock atomically; the loser of a race sees
/// [`Error::DirectoryLocked`].
pub(crate) fn acquire_writer(dir: &Path) -> Result<()> {
    match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(dir.join(WRITE_LOCK_FILE))
    {
        Ok(_) => Ok(()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            Err(Error::DirectoryLocked(dir.to_path_buf()))
        }
        Err(e) => Err(e.into()),
    }
}

pub(crate) fn release_writer(dir: &Path) -> Result<()> {
    match fs::remove_file(dir.join(WRITE_LOCK_FILE)) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

fn read_count(path: &Path) -> u64 {
    fs::read_to_string(path)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(0)
}

/// Increments the reader count, creating the sentinel at 1.
pub(crate) fn add_reader(dir: &Path) -> Result<()> {
    let path = dir.join(READER_LOCK_FILE);
    let count = read_count(&path);
    fs::write(&path, (count + 1).to_string())?;
    Ok(())
}

/// Decrements the reader count, removing the sentinel at zero.
pub(crate) fn remove_reader(dir: &Path) -> Result<()> {
    let path = dir.join(READER_LOCK_FILE);
    match read_count(&path) {
        0 | 1 => match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        },
        count => {
            fs::write(&path, (count - 1).to_string())?;
            Ok(())
        }
    }
}
