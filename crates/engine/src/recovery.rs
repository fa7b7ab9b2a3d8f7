//! Cold-start recovery: rebuilding the keydir when a directory is reopened.
//!
//! Two paths. The fast one parses the hint file left by a clean close. The
//! thorough one scans every segment front to back, newest-timestamp-wins,
//! tombstones filtered — taken whenever the previous session crashed (the
//! active file is still present), the hint is missing or cut short, or a
//! hint entry references a segment id no file on disk carries.

use keydir::{Keydir, Locator, Slot};
use record::{DataRecord, HintReader, RecordError};
use std::collections::HashMap;

use crate::{Access, Cask, Error, Result};

impl Cask {
    pub(crate) fn recover(&mut self) -> Result<()> {
        if self.opts.access == Access::Write {
            self.remove_tmp_files();
        }

        // A leftover active file means no clean close wrote the hint; scan
        // everything and adopt the leftover file as this handle's active
        // segment (its records are indexed under the fresh active id, so
        // reads resolve to the fixed active filename and appends continue
        // at its tail).
        if segment::active_path(&self.dir).exists() {
            return self.rebuild_from_segments();
        }

        if segment::hint_path(&self.dir).exists() && self.load_hint()? {
            return Ok(());
        }
        self.rebuild_from_segments()
    }

    /// Fast path: parse the hint file. Returns `Ok(false)` when the hint
    /// cannot be trusted (truncated, or a file id that resolves to no
    /// segment or more than one) — the caller falls back to scanning.
    ///
    /// Entries are installed only after the whole file parses, so a bad
    /// hint never leaves a half-built keydir behind.
    fn load_hint(&mut self) -> Result<bool> {
        // Hint records carry the low 32 bits of each segment id; rebuild
        // the full ids from the directory listing.
        let mut by_low: HashMap<u32, u64> = HashMap::new();
        for id in segment::list_segment_ids(&self.dir)? {
            if by_low.insert(id as u32, id).is_some() {
                return Ok(false);
            }
        }

        let mut reader = match HintReader::open(segment::hint_path(&self.dir)) {
            Ok(r) => r,
            Err(RecordError::Io(e)) => return Err(Error::Io(e)),
            Err(RecordError::Corrupt) => return Ok(false),
        };

        let mut entries = Vec::new();
        loop {
            match reader.next_record() {
                Ok(Some(rec)) => {
                    let file_id = match by_low.get(&rec.file_id) {
                        Some(id) => *id,
                        None => return Ok(false),
                    };
                    entries.push((
                        rec.key,
                        Locator {
                            file_id,
                            value_size: rec.value_size,
                            value_pos: rec.value_pos as u64,
                            stamp: rec.stamp,
                        },
                    ));
                }
                Ok(None) => break,
                Err(RecordError::Io(e)) => return Err(Error::Io(e)),
                Err(RecordError::Corrupt) => return Ok(false),
            }
        }

        for (key, loc) in entries {
            self.keydir.insert(key, Slot::Durable(loc));
        }
        Ok(true)
    }

    /// Thorough path: scan every closed segment oldest-first, then the
    /// leftover active file, keeping the newest record per key. A tombstone
    /// buries every record up to its timestamp; a later put resurrects the
    /// key.
    fn rebuild_from_segments(&mut self) -> Result<()> {
        let mut newest: HashMap<String, (u64, Option<Locator>)> = HashMap::new();
        let mut apply = |file_id: u64, pos: u64, rec: DataRecord| {
            if let Some((stamp, _)) = newest.get(&rec.key) {
                if *stamp > rec.stamp {
                    return;
                }
            }
            let loc = if rec.is_tombstone() {
                None
            } else {
                Some(Locator {
                    file_id,
                    value_size: rec.value.len() as u32,
                    value_pos: pos,
                    stamp: rec.stamp,
                })
            };
            newest.insert(rec.key, (rec.stamp, loc));
        };

        for id in segment::list_segment_ids(&self.dir)? {
            segment::scan(&segment::segment_path(&self.dir, id), |pos, rec| {
                apply(id, pos, rec)
            })?;
        }
        let active = segment::active_path(&self.dir);
        if active.exists() {
            let active_id = self.active_id;
            segment::scan(&active, |pos, rec| apply(active_id, pos, rec))?;
        }

        let mut keydir = Keydir::new();
        for (key, (_, loc)) in newest {
            if let Some(loc) = loc {
                keydir.insert(key, Slot::Durable(loc));
            }
        }
        self.keydir = keydir;
        Ok(())
    }

    /// Removes orphaned `*.tmp` files left by an interrupted merge or hint
    /// rewrite. Best-effort; a file that will not delete is simply ignored
    /// by every other code path.
    fn remove_tmp_files(&self) {
        if let Ok(entries) = std::fs::read_dir(&self.dir) {
            for entry in entries.flatten() {
                let p = entry.path();
                if let Some(name) = p.file_name().and_then(|n| n.to_str()) {
                    if name.ends_with(".tmp") {
                        let _ = std::fs::remove_file(&p);
                    }
                }
            }
        }
    }
}
