//! Hint-file generation: a compact keydir snapshot so the next open indexes
//! the store without touching a single value.

use keydir::Slot;
use record::HintRecord;
use std::fs::{self, OpenOptions};
use std::io::Write;

use crate::{Cask, Result};

impl Cask {
    /// Rewrites the hint file from the current keydir.
    ///
    /// Written to a `.tmp` name and renamed into place, so a crash mid-write
    /// leaves either the old snapshot or the new one, never a torn file.
    /// Pending slots are skipped — callers flush first, so there normally
    /// are none. The hint stores the low 32 bits of each 64-bit file id;
    /// open resolves them against the directory listing.
    pub(crate) fn write_hint(&self) -> Result<()> {
        let tmp = self.dir.join(format!("{}.tmp", segment::HINT_FILE));
        {
            let mut file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp)?;

            let mut buf = Vec::with_capacity(256);
            for (key, slot) in self.keydir.iter() {
                let loc = match slot {
                    Slot::Durable(loc) => loc,
                    Slot::Pending { .. } => continue,
                };
                let rec = HintRecord {
                    file_id: loc.file_id as u32,
                    value_size: loc.value_size,
                    value_pos: loc.value_pos as u32,
                    stamp: loc.stamp,
                    key: key.clone(),
                };
                rec.encode_into(&mut buf);
                file.write_all(&buf)?;
            }

            file.sync_all()?;
        }
        fs::rename(&tmp, segment::hint_path(&self.dir))?;
        Ok(())
    }
}
