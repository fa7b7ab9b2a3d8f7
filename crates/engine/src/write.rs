//! Write path: `put()`, `delete()`, and `sync()`.
//!
//! Mutations are staged in the pending buffer and mirrored into the keydir
//! as pending slots; `sync()` drains the buffer into the active segment,
//! rotating it when the size threshold is crossed, and turns the staged
//! slots durable. A delete is a put of the tombstone sentinel: once synced
//! it is appended like any record (so the deletion survives a crash) and the
//! key is dropped from the keydir.

use keydir::{Locator, PendingWrite, Slot};
use record::DataRecord;
use segment::ActiveSegment;

use crate::{Cask, Error, Result, MAX_KEY_SIZE, MAX_VALUE_SIZE, TOMBSTONE};

impl Cask {
    /// Stages a key/value pair.
    ///
    /// Requires write access. The write is visible to `get` immediately and
    /// becomes durable at the next flush (buffer full, explicit [`sync`],
    /// `sync_on_write`, or close).
    ///
    /// [`sync`]: Cask::sync
    pub fn put(&mut self, key: &str, value: &[u8]) -> Result<()> {
        self.check_writable()?;
        validate_key(key)?;
        if value.len() > MAX_VALUE_SIZE {
            return Err(Error::ValueTooLarge(value.len()));
        }

        if self.pending.len() >= self.opts.pending_max {
            self.sync()?;
        }

        let stamp = segment::now_nanos();
        self.pending.insert(
            key.to_string(),
            PendingWrite {
                stamp,
                value: value.to_vec(),
            },
        );
        self.keydir.insert(key.to_string(), Slot::Pending { stamp });

        if self.opts.sync_on_write {
            self.sync()?;
        }
        Ok(())
    }

    /// Stages a deletion: a put of the tombstone sentinel.
    ///
    /// `get` reports the key absent from this point on; the deletion is
    /// durable once the buffer flushes.
    pub fn delete(&mut self, key: &str) -> Result<()> {
        self.put(key, TOMBSTONE)
    }

    /// Drains the pending buffer into the active segment.
    ///
    /// Requires write access. Entries flush in unspecified order. Before
    /// each append the active segment's size is checked against the rotation
    /// threshold; crossing it renames the file to its numeric id and starts
    /// a fresh one under a new id. Tombstoned keys are appended (crash-
    /// durable) and removed from the keydir; everything else gets a durable
    /// keydir slot pointing at its new location. The file is fsynced once
    /// after the drain.
    ///
    /// A failure mid-drain is fatal to the whole flush; no partial commit is
    /// recorded.
    pub fn sync(&mut self) -> Result<()> {
        self.check_writable()?;
        if self.pending.is_empty() {
            return Ok(());
        }

        let staged = self.pending.take();
        let mut active = ActiveSegment::open(&self.dir)?;

        for (key, write) in staged {
            if active.len() >= self.opts.segment_max_bytes {
                active.rotate(self.active_id)?;
                self.active_id = segment::fresh_file_id(&self.dir);
            }

            let rec = DataRecord::new(write.stamp, key, write.value);
            if rec.is_tombstone() {
                self.keydir.remove(&rec.key);
                active.append(&rec)?;
            } else {
                let value_size = rec.value.len() as u32;
                let value_pos = active.append(&rec)?;
                self.keydir.insert(
                    rec.key,
                    Slot::Durable(Locator {
                        file_id: self.active_id,
                        value_size,
                        value_pos,
                        stamp: rec.stamp,
                    }),
                );
            }
        }

        active.sync()?;
        Ok(())
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::InvalidKey("key must not be empty".to_string()));
    }
    // Hint records are newline-terminated, so a newline in the key would
    // split the index entry in two.
    if key.contains('\n') {
        return Err(Error::InvalidKey(
            "key must not contain a newline".to_string(),
        ));
    }
    if key.len() > MAX_KEY_SIZE {
        return Err(Error::InvalidKey(format!(
            "key too large: {} bytes (max {})",
            key.len(),
            MAX_KEY_SIZE
        )));
    }
    Ok(())
}
