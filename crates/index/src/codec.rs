//! Blob encode/decode and crash-safe persistence for [`SparseIndex`].
//!
//! See [`crate::format`] for the byte layout. Decode validates the trailing
//! CRC32 before parsing anything, so a flipped bit anywhere in the blob is
//! caught up front rather than surfacing as a bogus offset later.

use byteorder::{LittleEndian, ReadBytesExt};
use crc32fast::Hasher as Crc32;
use std::fs::{rename, File, OpenOptions};
use std::io::{self, Cursor, Read, Write};
use std::path::Path;

use crate::format::{HEADER_BYTES, INDEX_MAGIC, MAX_KEY_BYTES, TRAILER_BYTES};
use crate::{IndexError, SparseIndex};

impl SparseIndex {
    /// Serializes the index to its blob form.
    #[must_use]
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(
            HEADER_BYTES + TRAILER_BYTES + self.samples.len() * 48,
        );
        buf.extend_from_slice(&INDEX_MAGIC.to_le_bytes());
        buf.extend_from_slice(&self.chunk_size.to_le_bytes());
        buf.extend_from_slice(&self.start_offset.to_le_bytes());
        buf.extend_from_slice(&(self.samples.len() as u64).to_le_bytes());

        for (key, offset) in &self.samples {
            buf.extend_from_slice(&(key.len() as u32).to_le_bytes());
            buf.extend_from_slice(key.as_bytes());
            buf.extend_from_slice(&offset.to_le_bytes());
        }

        let mut hasher = Crc32::new();
        hasher.update(&buf);
        buf.extend_from_slice(&hasher.finalize().to_le_bytes());
        buf
    }

    /// Parses an index blob.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Corrupt`] if the blob is shorter than the fixed
    /// layout, fails its checksum, carries an unknown magic, declares an
    /// oversized key, truncates mid-entry, or has bytes left over after the
    /// declared samples.
    pub fn decode(bytes: &[u8]) -> Result<SparseIndex, IndexError> {
        if bytes.len() < HEADER_BYTES + TRAILER_BYTES {
            return Err(IndexError::Corrupt("blob too small".to_string()));
        }

        let (body, trailer) = bytes.split_at(bytes.len() - TRAILER_BYTES);
        let stored_crc = u32::from_le_bytes([trailer[0], trailer[1], trailer[2], trailer[3]]);
        let mut hasher = Crc32::new();
        hasher.update(body);
        let actual_crc = hasher.finalize();
        if actual_crc != stored_crc {
            return Err(IndexError::Corrupt(format!(
                "checksum mismatch: expected {stored_crc:#010x}, got {actual_crc:#010x}"
            )));
        }

        let mut cur = Cursor::new(body);

        let magic = read_u32(&mut cur)?;
        if magic != INDEX_MAGIC {
            return Err(IndexError::Corrupt(format!("unknown magic: {magic:#x}")));
        }
        let chunk_size = read_u32(&mut cur)?;
        if chunk_size == 0 {
            return Err(IndexError::Corrupt("zero chunk size".to_string()));
        }
        let start_offset = read_u64(&mut cur)?;
        let n_samples = read_u64(&mut cur)?;

        let mut samples = Vec::new();
        for _ in 0..n_samples {
            let key_len = read_u32(&mut cur)? as usize;
            if key_len > MAX_KEY_BYTES {
                return Err(IndexError::Corrupt(format!(
                    "key_len {key_len} exceeds maximum {MAX_KEY_BYTES}"
                )));
            }
            let mut key = vec![0u8; key_len];
            cur.read_exact(&mut key)
                .map_err(|_| IndexError::Corrupt("truncated sample entry".to_string()))?;
            let key = String::from_utf8(key)
                .map_err(|_| IndexError::Corrupt("non-utf8 sample key".to_string()))?;
            let offset = read_u64(&mut cur)?;
            samples.push((key, offset));
        }

        if cur.position() != body.len() as u64 {
            return Err(IndexError::Corrupt("trailing bytes after samples".to_string()));
        }

        Ok(SparseIndex {
            chunk_size,
            start_offset,
            samples,
        })
    }

    /// Persists the encoded blob to `path`.
    ///
    /// The blob is written to a temporary file next to the target, fsynced,
    /// and atomically renamed into place; the temp file is removed on any
    /// failure. A crash mid-save leaves the previous index (if any) intact.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), IndexError> {
        let path = path.as_ref();
        let tmp_path = path.with_extension("six.tmp");
        let bytes = self.encode();

        let write = || -> io::Result<()> {
            let mut f = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)?;
            f.write_all(&bytes)?;
            f.sync_all()?;
            Ok(())
        };
        if let Err(e) = write() {
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        rename(&tmp_path, path)?;

        // Fsync the parent directory so the rename survives a crash.
        if let Some(parent) = path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        Ok(())
    }

    /// Reads and decodes an index blob from `path`.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Io`] if the file cannot be read and
    /// [`IndexError::Corrupt`] if its contents do not decode.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<SparseIndex, IndexError> {
        let bytes = std::fs::read(path)?;
        Self::decode(&bytes)
    }
}

fn read_u32(cur: &mut Cursor<&[u8]>) -> Result<u32, IndexError> {
    cur.read_u32::<LittleEndian>()
        .map_err(|_| IndexError::Corrupt("truncated blob".to_string()))
}

fn read_u64(cur: &mut Cursor<&[u8]>) -> Result<u64, IndexError> {
    cur.read_u64::<LittleEndian>()
        .map_err(|_| IndexError::Corrupt("truncated blob".to_string()))
}
