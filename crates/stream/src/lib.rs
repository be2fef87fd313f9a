//! # Stream — framed record files
//!
//! The on-disk record stream the index engine reads and seeks over. A stream
//! file is a fixed header followed by length-prefixed, CRC-checksummed record
//! frames. Records carry a string key (the sort/lookup identifier) and an
//! opaque payload.
//!
//! ## Binary layout
//!
//! ```text
//! [magic: u32 LE "RCS1"][version: u32 LE = 1]
//!
//! then one frame per record:
//! [record_len: u32 LE][crc32: u32 LE][body ...]
//! body: [key_len: u32 LE][key bytes][payload bytes]
//! ```
//!
//! `record_len` includes the 4-byte CRC but **not** itself. The CRC covers
//! the body. All integers are little-endian.
//!
//! Unlike a write-ahead log, a record stream is a complete data file: a torn
//! or checksum-failing frame anywhere is corruption, not a tolerated tail.
//!
//! ## Example
//!
//! ```rust,no_run
//! use stream::{StreamReader, StreamWriter};
//!
//! let mut w = StreamWriter::create("records.rcs").unwrap();
//! w.append("m01.1", b"first").unwrap();
//! w.append("m01.2", b"second").unwrap();
//! w.finish().unwrap();
//!
//! let mut r = StreamReader::open("records.rcs").unwrap();
//! while let Some(rec) = r.read_record().unwrap() {
//!     println!("{} @ {}", rec.key, rec.offset);
//! }
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use crc32fast::Hasher as Crc32;
use std::fs::{rename, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use thiserror::Error;

/// Magic number identifying record stream files (ASCII "RCS1").
pub const STREAM_MAGIC: u32 = 0x5243_5331;

/// Current stream format version.
pub const STREAM_VERSION: u32 = 1;

/// Size of the file header in bytes: 4 (`magic`) + 4 (`version`).
pub const HEADER_BYTES: u64 = 8;

/// Maximum frame size accepted on reads (64 MiB). Prevents OOM on corrupt files.
const MAX_RECORD_BYTES: u32 = 64 * 1024 * 1024;
/// Maximum key size accepted on reads and writes (64 KiB).
const MAX_KEY_BYTES: usize = 64 * 1024;

/// A single decoded record.
///
/// `offset` is the byte position at which the record's frame begins in the
/// stream file — the value a reader's cursor had immediately before the frame
/// was read. It is what the index stores and seeks back to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The lookup key.
    pub key: String,
    /// The opaque record payload.
    pub payload: Vec<u8>,
    /// Byte offset of the frame start within the stream file.
    pub offset: u64,
}

/// Errors that can occur reading or writing record streams.
#[derive(Debug, Error)]
pub enum StreamError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A frame failed CRC validation, was truncated, or the file header is
    /// not a record stream header.
    #[error("corrupt record stream")]
    Corrupt,
}

/// Append-only record stream writer.
///
/// Frames are serialized into an in-memory buffer, CRC-checksummed, and
/// written to the underlying file through a `BufWriter`. Call
/// [`finish`](StreamWriter::finish) to flush and fsync; dropping the writer
/// without it may leave buffered frames unwritten.
pub struct StreamWriter {
    file: BufWriter<File>,
    /// Reusable scratch buffer to avoid allocation on every append.
    buf: Vec<u8>,
}

impl StreamWriter {
    /// Creates (or truncates) a stream file at `path` and writes the header.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, StreamError> {
        let raw = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        let mut file = BufWriter::new(raw);
        file.write_u32::<LittleEndian>(STREAM_MAGIC)?;
        file.write_u32::<LittleEndian>(STREAM_VERSION)?;
        Ok(Self {
            file,
            buf: Vec::with_capacity(256),
        })
    }

    /// Serializes one record and appends its frame to the file.
    pub fn append(&mut self, key: &str, payload: &[u8]) -> Result<(), StreamError> {
        if key.len() > MAX_KEY_BYTES {
            return Err(StreamError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "record key exceeds 64 KiB",
            )));
        }

        // Body: key_len + key + payload, reusing the scratch buffer.
        self.buf.clear();
        self.buf.write_u32::<LittleEndian>(key.len() as u32)?;
        self.buf.extend_from_slice(key.as_bytes());
        self.buf.extend_from_slice(payload);

        let mut hasher = Crc32::new();
        hasher.update(&self.buf);
        let crc = hasher.finalize();

        // record_len = body + 4 (CRC), must fit in u32
        let record_len = self.buf.len() as u64 + 4;
        if record_len > u64::from(MAX_RECORD_BYTES) {
            return Err(StreamError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "record frame too large",
            )));
        }

        self.file.write_u32::<LittleEndian>(record_len as u32)?;
        self.file.write_u32::<LittleEndian>(crc)?;
        self.file.write_all(&self.buf)?;
        Ok(())
    }

    /// Flushes buffered frames and fsyncs the file.
    pub fn finish(self) -> Result<(), StreamError> {
        let mut file = self.file;
        file.flush()?;
        file.into_inner().map_err(io::Error::from)?.sync_all()?;
        Ok(())
    }
}

/// Seekable record stream reader.
///
/// [`open`](StreamReader::open) validates the header and leaves the cursor at
/// the first record. The cursor then advances one frame per
/// [`read_record`](StreamReader::read_record) call and can be repositioned to
/// any frame start with [`seek`](StreamReader::seek).
///
/// Cursor state is not shareable: concurrent lookups over the same file must
/// each open their own reader.
pub struct StreamReader {
    rdr: BufReader<File>,
}

impl StreamReader {
    /// Opens a stream file and validates its header.
    ///
    /// # Errors
    ///
    /// Returns [`StreamError::Corrupt`] if the file is shorter than the
    /// header or the magic/version do not match, and [`StreamError::Io`] on
    /// any I/O failure.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StreamError> {
        let f = File::open(path)?;
        let mut rdr = BufReader::new(f);

        let magic = read_u32_or_corrupt(&mut rdr)?;
        let version = read_u32_or_corrupt(&mut rdr)?;
        if magic != STREAM_MAGIC || version != STREAM_VERSION {
            return Err(StreamError::Corrupt);
        }

        Ok(Self { rdr })
    }

    /// Byte offset of the first record (immediately after the header).
    #[must_use]
    pub fn data_start(&self) -> u64 {
        HEADER_BYTES
    }

    /// Current cursor position in bytes from the start of the file.
    pub fn position(&mut self) -> Result<u64, StreamError> {
        Ok(self.rdr.stream_position()?)
    }

    /// Repositions the cursor to an absolute byte offset.
    ///
    /// The offset must be a frame start (such as a [`Record::offset`] or an
    /// index sample offset); reading from mid-frame positions fails with
    /// [`StreamError::Corrupt`].
    pub fn seek(&mut self, offset: u64) -> Result<(), StreamError> {
        self.rdr.seek(SeekFrom::Start(offset))?;
        Ok(())
    }

    /// Reads the record frame at the cursor, advancing past it.
    ///
    /// Returns `Ok(None)` on a clean end of file at a frame boundary. A
    /// partial frame, an implausible length, a CRC mismatch, or a non-UTF-8
    /// key all return [`StreamError::Corrupt`].
    pub fn read_record(&mut self) -> Result<Option<Record>, StreamError> {
        let offset = self.rdr.stream_position()?;

        let record_len = match self.rdr.read_u32::<LittleEndian>() {
            Ok(v) => v,
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(StreamError::Io(e)),
        };
        if record_len < 8 || record_len > MAX_RECORD_BYTES {
            return Err(StreamError::Corrupt);
        }

        let crc = read_u32_or_corrupt(&mut self.rdr)?;

        let body_len = (record_len - 4) as usize;
        let mut body = vec![0u8; body_len];
        match self.rdr.read_exact(&mut body) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                return Err(StreamError::Corrupt)
            }
            Err(e) => return Err(StreamError::Io(e)),
        }

        let mut hasher = Crc32::new();
        hasher.update(&body);
        if hasher.finalize() != crc {
            return Err(StreamError::Corrupt);
        }

        // body: [key_len: u32][key][payload]
        let key_len = u32::from_le_bytes([body[0], body[1], body[2], body[3]]) as usize;
        if key_len > MAX_KEY_BYTES || 4 + key_len > body.len() {
            return Err(StreamError::Corrupt);
        }
        let key = std::str::from_utf8(&body[4..4 + key_len])
            .map_err(|_| StreamError::Corrupt)?
            .to_string();
        let payload = body[4 + key_len..].to_vec();

        Ok(Some(Record {
            key,
            payload,
            offset,
        }))
    }
}

/// Reads every record of `src`, stable-sorts by key under
/// [`keyorder::compare`], and writes the result to `dst`.
///
/// Stability preserves the original relative order of equal-key records. The
/// output is written to a temporary file next to `dst`, fsynced, and
/// atomically renamed into place; the temp file is removed on any failure.
pub fn sort_stream<P: AsRef<Path>, Q: AsRef<Path>>(src: P, dst: Q) -> Result<(), StreamError> {
    let mut reader = StreamReader::open(src)?;
    let mut records = Vec::new();
    while let Some(rec) = reader.read_record()? {
        records.push(rec);
    }
    records.sort_by(|a, b| keyorder::compare(&a.key, &b.key));

    let dst = dst.as_ref();
    let tmp_path = dst.with_extension("rcs.tmp");

    let write_all = || -> Result<(), StreamError> {
        let mut w = StreamWriter::create(&tmp_path)?;
        for rec in &records {
            w.append(&rec.key, &rec.payload)?;
        }
        w.finish()
    };
    if let Err(e) = write_all() {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }

    rename(&tmp_path, dst)?;

    // Fsync the parent directory so the rename survives a crash.
    if let Some(parent) = dst.parent() {
        if let Ok(dir) = File::open(parent) {
            let _ = dir.sync_all();
        }
    }

    Ok(())
}

fn read_u32_or_corrupt<R: Read>(rdr: &mut R) -> Result<u32, StreamError> {
    match rdr.read_u32::<LittleEndian>() {
        Ok(v) => Ok(v),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(StreamError::Corrupt),
        Err(e) => Err(StreamError::Io(e)),
    }
}
