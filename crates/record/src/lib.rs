//! # Record — CaskDB on-disk record codec
//!
//! Serialization for the two record kinds CaskDB persists: **data records**
//! (appended to segment files) and **hint records** (written to the hint
//! file, a compact index snapshot used at open).
//!
//! ## Data record layout
//!
//! ```text
//! [crc32: u32 BE][timestamp: u64 BE][key_size: u32 BE][value_size: u32 BE][key][value]
//! ```
//!
//! The CRC32 (IEEE) covers every byte **after** the CRC field itself, i.e.
//! timestamp through the end of the value. Record length is
//! `20 + key_size + value_size`. A deletion is an ordinary data record whose
//! value is the sentinel byte sequence [`TOMBSTONE`].
//!
//! ## Hint record layout
//!
//! ```text
//! [file_id: u32 BE][value_size: u32 BE][value_pos: u32 BE][timestamp: u64 BE][key][0x0A]
//! ```
//!
//! Hint records carry no value bytes and no CRC — they are regenerated from
//! the in-memory keydir at every close and merge. The key runs to the
//! newline terminator, which is why keys may not contain `0x0A`.
//!
//! All integers are big-endian; the layouts are the interchange format and
//! must stay bit-exact across implementations.
//!
//! ## Example
//!
//! ```rust,no_run
//! use record::{DataReader, DataRecord};
//!
//! let rec = DataRecord::new(1, "hello".to_string(), b"world".to_vec());
//! let mut buf = Vec::new();
//! rec.encode_into(&mut buf);
//! std::fs::write("seg", &buf).unwrap();
//!
//! let mut r = DataReader::open("seg").unwrap();
//! while let Some((pos, rec)) = r.next_record().unwrap() {
//!     println!("{pos}: {:?}", rec);
//! }
//! ```

use byteorder::{BigEndian, ReadBytesExt};
use crc32fast::Hasher as Crc32;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use thiserror::Error;

/// Sentinel value marking a deletion.
///
/// A data record whose value equals this byte sequence is a tombstone: the
/// key it names is dead from that record's timestamp onward.
pub const TOMBSTONE: &[u8] = b"TOMBSTONE";

/// Fixed header length of a data record (crc + timestamp + key_size + value_size).
pub const DATA_HEADER_LEN: u64 = 20;

/// Fixed header length of a hint record (file_id + value_size + value_pos + timestamp).
pub const HINT_HEADER_LEN: usize = 20;

// Decode-side sanity caps. Sizes beyond these cannot come from a record this
// engine wrote (the write path enforces much tighter limits) and are treated
// as corruption rather than allocation requests.
const MAX_KEY_SIZE: u32 = 16 * 1024 * 1024;
const MAX_VALUE_SIZE: u32 = 64 * 1024 * 1024;

/// Errors that can occur while encoding or decoding records.
#[derive(Debug, Error)]
pub enum RecordError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A record failed CRC validation, carried an implausible size field,
    /// a non-UTF-8 key, or a hint record was cut short.
    #[error("corrupt record")]
    Corrupt,
}

/// A single data record: one key/value pair stamped with the wall-clock
/// nanosecond timestamp of the put that produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataRecord {
    /// Nanoseconds since the Unix epoch, assigned when the write was staged.
    pub stamp: u64,
    /// The lookup key.
    pub key: String,
    /// The payload value, or [`TOMBSTONE`] for a deletion.
    pub value: Vec<u8>,
}

impl DataRecord {
    pub fn new(stamp: u64, key: String, value: Vec<u8>) -> Self {
        Self { stamp, key, value }
    }

    /// Builds a deletion record for `key`.
    pub fn tombstone(stamp: u64, key: String) -> Self {
        Self::new(stamp, key, TOMBSTONE.to_vec())
    }

    /// True if this record marks a deletion.
    pub fn is_tombstone(&self) -> bool {
        self.value == TOMBSTONE
    }

    /// Total encoded length in bytes.
    pub fn encoded_len(&self) -> u64 {
        DATA_HEADER_LEN + self.key.len() as u64 + self.value.len() as u64
    }

    /// Serializes the record into `buf` (cleared first, allocation reused).
    ///
    /// The CRC slot is reserved up front and filled after hashing everything
    /// behind it, so the record is built in a single pass.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.clear();
        buf.extend_from_slice(&[0u8; 4]);
        buf.extend_from_slice(&self.stamp.to_be_bytes());
        buf.extend_from_slice(&(self.key.len() as u32).to_be_bytes());
        buf.extend_from_slice(&(self.value.len() as u32).to_be_bytes());
        buf.extend_from_slice(self.key.as_bytes());
        buf.extend_from_slice(&self.value);

        let mut hasher = Crc32::new();
        hasher.update(&buf[4..]);
        let crc = hasher.finalize();
        buf[0..4].copy_from_slice(&crc.to_be_bytes());
    }
}

/// Sequential reader over a stream of data records.
///
/// Generic over any `Read` implementor so tests can feed it in-memory
/// buffers. Each record's CRC is verified on the way out. A truncated record
/// at the end of the stream (e.g. from a crash mid-append) is reported as a
/// clean end-of-stream — every fully written record before it is still
/// yielded.
pub struct DataReader<R: Read> {
    rdr: BufReader<R>,
    pos: u64,
}

impl DataReader<File> {
    /// Opens a segment file for sequential decoding.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<DataReader<File>, RecordError> {
        let f = File::open(path)?;
        Ok(DataReader {
            rdr: BufReader::new(f),
            pos: 0,
        })
    }
}

impl<R: Read> DataReader<R> {
    /// Constructs a reader from any `Read` implementor.
    pub fn from_reader(reader: R) -> Self {
        DataReader {
            rdr: BufReader::new(reader),
            pos: 0,
        }
    }

    /// Decodes the next record, returning its starting byte offset alongside.
    ///
    /// # Termination
    ///
    /// - **Clean EOF** (no more bytes) -> `Ok(None)`.
    /// - **Truncated tail** (partial record at end) -> `Ok(None)` after all
    ///   complete records have been yielded.
    /// - **CRC mismatch, implausible size, non-UTF-8 key** ->
    ///   `Err(RecordError::Corrupt)`.
    /// - **I/O error** -> `Err(RecordError::Io(...))`.
    pub fn next_record(&mut self) -> Result<Option<(u64, DataRecord)>, RecordError> {
        let start = self.pos;

        let crc = match self.rdr.read_u32::<BigEndian>() {
            Ok(v) => v,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(RecordError::Io(e)),
        };

        // Fixed remainder of the header: timestamp + key_size + value_size.
        let mut fixed = [0u8; 16];
        match self.rdr.read_exact(&mut fixed) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(RecordError::Io(e)),
        }
        let mut hdr = &fixed[..];
        let stamp = hdr.read_u64::<BigEndian>()?;
        let key_size = hdr.read_u32::<BigEndian>()?;
        let value_size = hdr.read_u32::<BigEndian>()?;

        if key_size == 0 || key_size > MAX_KEY_SIZE || value_size > MAX_VALUE_SIZE {
            return Err(RecordError::Corrupt);
        }

        let mut key = vec![0u8; key_size as usize];
        match self.rdr.read_exact(&mut key) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(RecordError::Io(e)),
        }
        let mut value = vec![0u8; value_size as usize];
        match self.rdr.read_exact(&mut value) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(RecordError::Io(e)),
        }

        // Verify only after the full record is in hand; a short read above is
        // a crash tail, not corruption.
        let mut hasher = Crc32::new();
        hasher.update(&fixed);
        hasher.update(&key);
        hasher.update(&value);
        if hasher.finalize() != crc {
            return Err(RecordError::Corrupt);
        }

        let key = String::from_utf8(key).map_err(|_| RecordError::Corrupt)?;

        self.pos = start + DATA_HEADER_LEN + key_size as u64 + value_size as u64;
        Ok(Some((start, DataRecord { stamp, key, value })))
    }
}

/// A single hint record: the keydir locator for one key, minus the value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HintRecord {
    /// Low 32 bits of the id of the segment containing the value.
    pub file_id: u32,
    /// Length of the value in bytes.
    pub value_size: u32,
    /// Byte offset of the data record's start within its segment.
    pub value_pos: u32,
    /// Timestamp of the data record.
    pub stamp: u64,
    /// The key.
    pub key: String,
}

impl HintRecord {
    /// Serializes the record into `buf` (cleared first, allocation reused).
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.clear();
        buf.extend_from_slice(&self.file_id.to_be_bytes());
        buf.extend_from_slice(&self.value_size.to_be_bytes());
        buf.extend_from_slice(&self.value_pos.to_be_bytes());
        buf.extend_from_slice(&self.stamp.to_be_bytes());
        buf.extend_from_slice(self.key.as_bytes());
        buf.push(b'\n');
    }
}

/// Sequential reader over a hint file.
///
/// Unlike data records, hint records have no CRC and no tolerance for a
/// short tail: the hint file is rewritten wholesale at close/merge, so any
/// truncation means it cannot be trusted and decoding reports `Corrupt`
/// (callers fall back to scanning the segments).
pub struct HintReader<R: Read> {
    rdr: BufReader<R>,
}

impl HintReader<File> {
    /// Opens a hint file for sequential decoding.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<HintReader<File>, RecordError> {
        let f = File::open(path)?;
        Ok(HintReader {
            rdr: BufReader::new(f),
        })
    }
}

impl<R: Read> HintReader<R> {
    /// Constructs a reader from any `Read` implementor.
    pub fn from_reader(reader: R) -> Self {
        HintReader {
            rdr: BufReader::new(reader),
        }
    }

    /// Decodes the next hint record, or `Ok(None)` at a clean end-of-file.
    pub fn next_record(&mut self) -> Result<Option<HintRecord>, RecordError> {
        let mut header = [0u8; HINT_HEADER_LEN];
        match read_full(&mut self.rdr, &mut header)? {
            0 => return Ok(None),
            n if n < HINT_HEADER_LEN => return Err(RecordError::Corrupt),
            _ => {}
        }

        let mut hdr = &header[..];
        let file_id = hdr.read_u32::<BigEndian>()?;
        let value_size = hdr.read_u32::<BigEndian>()?;
        let value_pos = hdr.read_u32::<BigEndian>()?;
        let stamp = hdr.read_u64::<BigEndian>()?;

        let mut key = Vec::new();
        self.rdr.read_until(b'\n', &mut key)?;
        if key.pop() != Some(b'\n') || key.is_empty() {
            return Err(RecordError::Corrupt);
        }
        let key = String::from_utf8(key).map_err(|_| RecordError::Corrupt)?;

        Ok(Some(HintRecord {
            file_id,
            value_size,
            value_pos,
            stamp,
            key,
        }))
    }
}

/// Reads until `buf` is full or EOF, returning the byte count. Lets callers
/// tell a clean EOF (0) from a truncated header (0 < n < len).
fn read_full<R: Read>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut n = 0;
    while n < buf.len() {
        match r.read(&mut buf[n..]) {
            Ok(0) => break,
            Ok(m) => n += m,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(n)
}
