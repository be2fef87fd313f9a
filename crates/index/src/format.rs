//! Index blob format constants.
//!
//! ## v1 blob - magic `SIX1` (`0x5349_5831`)
//!
//! ```text
//! [magic: u32 LE][chunk_size: u32 LE][start_offset: u64 LE][n_samples: u64 LE]
//! repeated n_samples times:
//!     [key_len: u32 LE][key bytes][offset: u64 LE]
//! [crc32: u32 LE]
//! ```
//!
//! The trailing CRC32 covers every byte before it. All integers are
//! little-endian. The codec in [`crate::SparseIndex::decode`] is the only
//! component that understands this layout; everything else treats the blob
//! as opaque bytes.

/// Magic number identifying sparse index blobs (ASCII "SIX1").
pub const INDEX_MAGIC: u32 = 0x5349_5831;

/// Size of the fixed blob header in bytes:
/// 4 (`magic`) + 4 (`chunk_size`) + 8 (`start_offset`) + 8 (`n_samples`).
pub const HEADER_BYTES: usize = 4 + 4 + 8 + 8;

/// Size of the trailing checksum in bytes.
pub const TRAILER_BYTES: usize = 4;

/// Maximum sample key size accepted during decode (64 KiB). Prevents OOM on
/// corrupt blobs.
pub(crate) const MAX_KEY_BYTES: usize = 64 * 1024;
