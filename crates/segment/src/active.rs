use record::DataRecord;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::layout::{active_path, segment_path};
use crate::SegmentError;

/// Append handle over the active segment.
///
/// Opened at the start of a flush pass and dropped when the pass ends, so
/// the descriptor never outlives the operation that needed it. Records are
/// serialized into a reusable scratch buffer and written with a single
/// `write_all` each.
#[derive(Debug)]
pub struct ActiveSegment {
    dir: PathBuf,
    file: File,
    len: u64,
    /// Reusable scratch buffer to avoid allocation on every append.
    buf: Vec<u8>,
}

impl ActiveSegment {
    /// Opens (or creates) the active file in append mode, picking up its
    /// current size as the write offset.
    pub fn open(dir: &Path) -> Result<Self, SegmentError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(active_path(dir))?;
        let len = file.metadata()?.len();
        Ok(Self {
            dir: dir.to_path_buf(),
            file,
            len,
            buf: Vec::with_capacity(256),
        })
    }

    /// Current size of the active file in bytes.
    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Appends `rec`, returning the byte offset the record starts at.
    pub fn append(&mut self, rec: &DataRecord) -> Result<u64, SegmentError> {
        let pos = self.len;
        rec.encode_into(&mut self.buf);
        self.file.write_all(&self.buf)?;
        self.len += self.buf.len() as u64;
        Ok(pos)
    }

    /// Retires the current contents under `retired_id` and starts a fresh,
    /// empty active file.
    ///
    /// `retired_id` must be the id the records now in the file were indexed
    /// under; the rename is what turns those references numeric.
    pub fn rotate(&mut self, retired_id: u64) -> Result<(), SegmentError> {
        self.file.sync_all()?;
        fs::rename(active_path(&self.dir), segment_path(&self.dir, retired_id))?;
        self.file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(active_path(&self.dir))?;
        self.len = 0;
        Ok(())
    }

    /// Forces appended records to disk via `sync_all()` (fsync).
    pub fn sync(&mut self) -> Result<(), SegmentError> {
        self.file.sync_all()?;
        Ok(())
    }
}

/// Moves the active file out of the way at close: renamed to its numeric id
/// when it holds records, removed when empty, a no-op when absent.
///
/// After this the directory contains only numeric segments, which is what
/// lets hint-file references resolve on the next open.
pub fn retire_active(dir: &Path, active_id: u64) -> Result<(), SegmentError> {
    let path = active_path(dir);
    match fs::metadata(&path) {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SegmentError::Io(e)),
        Ok(meta) if meta.len() == 0 => {
            fs::remove_file(&path)?;
            Ok(())
        }
        Ok(_) => {
            fs::rename(&path, segment_path(dir, active_id))?;
            Ok(())
        }
    }
}
