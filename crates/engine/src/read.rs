//! Read path: `get()`, `list_keys()`, and `fold()`.
//!
//! A lookup resolves through the keydir: pending slots answer from the
//! in-memory buffer, durable slots cost exactly one seek into the segment
//! the keydir names. Point reads skip CRC verification; corruption is
//! caught when segments are scanned at recovery.

use keydir::Slot;

use crate::{Cask, Error, Result, TOMBSTONE};

impl Cask {
    /// Looks up a key, returning its value bytes.
    ///
    /// Pending writes supersede durable records; a pending tombstone makes
    /// the key absent. Durable entries are read from the fixed active
    /// filename while their file id is still the live append target, from
    /// the numeric segment otherwise.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if the key is absent or deleted; `Error::Io`
    /// if the segment read fails.
    pub fn get(&self, key: &str) -> Result<Vec<u8>> {
        match self.keydir.get(key) {
            None => Err(Error::KeyNotFound(key.to_string())),
            Some(Slot::Pending { .. }) => match self.pending.get(key) {
                Some(write) if write.value != TOMBSTONE => Ok(write.value.clone()),
                _ => Err(Error::KeyNotFound(key.to_string())),
            },
            Some(Slot::Durable(loc)) => Ok(segment::read_value(
                &self.dir,
                loc.file_id,
                self.active_id,
                key.len(),
                loc.value_pos,
                loc.value_size,
            )?),
        }
    }

    /// All live keys, sorted ascending.
    ///
    /// Keys whose pending value is the tombstone are not live and are left
    /// out (they leave the keydir entirely at the next flush).
    pub fn list_keys(&self) -> Vec<String> {
        self.keydir
            .sorted_keys()
            .into_iter()
            .filter(|key| !self.pending_is_tombstone(key))
            .collect()
    }

    /// Folds `f` over every live key/value pair, in unspecified key order.
    ///
    /// Each key is resolved through [`get`]; keys deleted mid-buffer are
    /// skipped.
    ///
    /// [`get`]: Cask::get
    pub fn fold<A, F>(&self, mut f: F, seed: A) -> Result<A>
    where
        F: FnMut(&str, &[u8], A) -> A,
    {
        let mut acc = seed;
        for (key, _) in self.keydir.iter() {
            match self.get(key) {
                Ok(value) => acc = f(key, &value, acc),
                Err(Error::KeyNotFound(_)) => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(acc)
    }

    fn pending_is_tombstone(&self, key: &str) -> bool {
        self.pending
            .get(key)
            .map(|w| w.value == TOMBSTONE)
            .unwrap_or(false)
    }
}
