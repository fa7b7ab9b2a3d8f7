//! Merge: rewrites live values from closed segments into one compacted
//! segment and drops everything they superseded.
//!
//! The swap follows the same tmp-then-rename pattern the hint rewrite uses:
//! the compacted segment is built under a `.tmp` name, fsynced, renamed to
//! its numeric id, and only then is the keydir repointed, the stale files
//! deleted, and the hint file regenerated. A failure before the rename
//! removes the `.tmp` file and leaves the store exactly as it was.

use keydir::{Locator, Slot};
use record::DataRecord;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::{Cask, Result};

impl Cask {
    /// Compacts the store: every keydir entry living outside the active
    /// segment is rewritten into a fresh segment, stale files are deleted,
    /// and the hint file is rebuilt.
    ///
    /// Requires write access. Flushes the pending buffer first, so the
    /// keydir is fully durable when election happens. After a merge the
    /// directory holds at most two segments: the active one and the
    /// compacted one.
    ///
    /// # Errors
    ///
    /// Returns an error on I/O failure; the pre-merge state survives any
    /// failure before the compacted segment is renamed into place.
    pub fn merge(&mut self) -> Result<()> {
        self.check_writable()?;
        self.sync()?;

        // Names present now; whatever of these is not essential afterwards
        // is superseded and gets deleted. The compacted segment is created
        // later, so it can never elect itself.
        let stale = self.stale_candidates()?;

        let victims: Vec<(String, Locator)> = self
            .keydir
            .iter()
            .filter_map(|(key, slot)| match slot {
                Slot::Durable(loc) if loc.file_id != self.active_id => {
                    Some((key.clone(), *loc))
                }
                _ => None,
            })
            .collect();

        if !victims.is_empty() {
            let merge_id = segment::fresh_file_id(&self.dir);
            let tmp_path = self.dir.join(format!("{merge_id}.tmp"));

            let relocated = match self.write_compacted(&tmp_path, merge_id, &victims) {
                Ok(relocated) => relocated,
                Err(e) => {
                    let _ = fs::remove_file(&tmp_path);
                    return Err(e);
                }
            };
            if let Err(e) = fs::rename(&tmp_path, segment::segment_path(&self.dir, merge_id)) {
                let _ = fs::remove_file(&tmp_path);
                return Err(e.into());
            }

            for (key, loc) in relocated {
                self.keydir.insert(key, Slot::Durable(loc));
            }
        }

        for path in &stale {
            let _ = fs::remove_file(path);
        }

        self.write_hint()?;
        Ok(())
    }

    /// Everything in the directory that is neither the active segment, the
    /// hint file, nor a lock sentinel.
    fn stale_candidates(&self) -> Result<Vec<PathBuf>> {
        let keep = [
            segment::ACTIVE_FILE,
            segment::HINT_FILE,
            segment::WRITE_LOCK_FILE,
            segment::READER_LOCK_FILE,
        ];
        let mut stale = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let is_essential = name.to_str().map(|n| keep.contains(&n)).unwrap_or(false);
            if !is_essential {
                stale.push(entry.path());
            }
        }
        Ok(stale)
    }

    /// Streams every victim's value into the segment at `tmp`, returning the
    /// locators the keydir should point at once the file is renamed to
    /// `merge_id`. Timestamps are preserved from the original records.
    fn write_compacted(
        &self,
        tmp: &Path,
        merge_id: u64,
        victims: &[(String, Locator)],
    ) -> Result<Vec<(String, Locator)>> {
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(tmp)?;

        let mut buf = Vec::with_capacity(256);
        let mut pos: u64 = 0;
        let mut relocated = Vec::with_capacity(victims.len());

        for (key, loc) in victims {
            let value = segment::read_value(
                &self.dir,
                loc.file_id,
                self.active_id,
                key.len(),
                loc.value_pos,
                loc.value_size,
            )?;
            let rec = DataRecord::new(loc.stamp, key.clone(), value);
            rec.encode_into(&mut buf);
            file.write_all(&buf)?;

            relocated.push((
                key.clone(),
                Locator {
                    file_id: merge_id,
                    value_size: loc.value_size,
                    value_pos: pos,
                    stamp: loc.stamp,
                },
            ));
            pos += buf.len() as u64;
        }

        file.sync_all()?;
        Ok(relocated)
    }
}
