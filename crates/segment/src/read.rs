use record::{DataReader, DataRecord, RecordError, DATA_HEADER_LEN};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::layout::{active_path, segment_path};
use crate::SegmentError;

/// Resolves a keydir file id to a path: the fixed active name while the id
/// is still the live append target, the numeric name once rotated.
fn locate(dir: &Path, file_id: u64, active_id: u64) -> PathBuf {
    if file_id == active_id {
        active_path(dir)
    } else {
        segment_path(dir, file_id)
    }
}

/// Reads exactly one value out of a segment: seek to
/// `value_pos + header + key`, read `value_size` bytes, close the file.
///
/// No CRC verification happens here — point reads pay one seek and one read;
/// corruption is caught when segments are scanned at recovery.
pub fn read_value(
    dir: &Path,
    file_id: u64,
    active_id: u64,
    key_len: usize,
    value_pos: u64,
    value_size: u32,
) -> Result<Vec<u8>, SegmentError> {
    let mut file = File::open(locate(dir, file_id, active_id))?;
    file.seek(SeekFrom::Start(value_pos + DATA_HEADER_LEN + key_len as u64))?;
    let mut value = vec![0u8; value_size as usize];
    file.read_exact(&mut value)?;
    Ok(value)
}

/// Walks every record in the segment at `path`, calling `visit` with the
/// record and its starting offset.
///
/// A truncated final record (crash tail) ends the walk cleanly; a CRC
/// mismatch in the body surfaces as [`SegmentError::Corrupt`] naming the
/// file.
pub fn scan<F>(path: &Path, mut visit: F) -> Result<(), SegmentError>
where
    F: FnMut(u64, DataRecord),
{
    let mut reader = match DataReader::open(path) {
        Ok(r) => r,
        Err(RecordError::Io(e)) => return Err(SegmentError::Io(e)),
        Err(RecordError::Corrupt) => return Err(SegmentError::Corrupt(path.to_path_buf())),
    };
    loop {
        match reader.next_record() {
            Ok(Some((pos, rec))) => visit(pos, rec),
            Ok(None) => return Ok(()),
            Err(RecordError::Io(e)) => return Err(SegmentError::Io(e)),
            Err(RecordError::Corrupt) => return Err(SegmentError::Corrupt(path.to_path_buf())),
        }
    }
}
