//! # Index - sparse key index over sorted record streams
//!
//! Random access by key over a large, append-only record stream sorted under
//! [`keyorder::compare`], without loading the stream into memory. The index
//! samples every `chunk_size`-th record of the sorted stream (plus the last
//! record, always) and stores each sampled key with the byte offset at which
//! its record begins. A lookup binary-searches the samples for the bracket
//! enclosing the queried key, then linearly scans at most one chunk-sized
//! region of the stream.
//!
//! ```text
//! sorted stream ──> build_index ──> SparseIndex ──> encode/save ──> blob
//!                                                                    │
//! lookup(reader, key, &index) <── SparseIndex <── decode/load <──────┘
//! ```
//!
//! Indexes are *build-once, read-many*: a [`SparseIndex`] is immutable after
//! construction and freely shareable across threads. Each concurrent lookup
//! needs its own [`stream::StreamReader`] because cursor state is not
//! shareable. A change to the source stream requires a full rebuild.
//!
//! ## Module responsibilities
//!
//! | Module      | Purpose                                            |
//! |-------------|----------------------------------------------------|
//! | `lib.rs`    | `SparseIndex` structure, accessors, `IndexError`   |
//! | [`builder`] | single-pass sampling build, sort-order verification |
//! | [`codec`]   | blob encode/decode, crash-safe save, load           |
//! | [`query`]   | bracket search, region scans, match expansion       |

mod builder;
mod codec;
mod format;
mod query;

pub use builder::build_index;
pub use format::{HEADER_BYTES, INDEX_MAGIC, TRAILER_BYTES};
pub use query::lookup;

use std::io;

use thiserror::Error;

/// Errors that can occur building, loading, or querying a sparse index.
#[derive(Debug, Error)]
pub enum IndexError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The record stream itself failed to read (torn frame, bad checksum).
    #[error("record stream error: {0}")]
    Stream(#[from] stream::StreamError),

    /// Two consecutive records of the build input violated the key ordering.
    /// No usable index is produced.
    #[error("input not sorted at record {position}: {prev:?} > {next:?}")]
    UnsortedInput {
        /// 0-based ordinal of the out-of-order record.
        position: u64,
        /// Key of the preceding record.
        prev: String,
        /// Key of the offending record.
        next: String,
    },

    /// The index blob is malformed or truncated.
    #[error("corrupt index: {0}")]
    Corrupt(String),
}

/// A sparse positional index over a sorted record stream.
///
/// Holds one `(key, offset)` sample per `chunk_size` records plus the final
/// record's sample. Sample keys are strictly increasing under
/// [`keyorder::compare`]; when the final record repeats the previous sample's
/// key the earlier sample is kept, so the stored offset always points at the
/// first sampled record bearing that key.
///
/// A zero-sample index (from an empty stream) carries no data; lookups
/// against it return no matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseIndex {
    chunk_size: u32,
    start_offset: u64,
    /// Sampled `(key, frame offset)` pairs in stream order.
    samples: Vec<(String, u64)>,
}

impl SparseIndex {
    /// The sampling interval the index was built with.
    #[must_use]
    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// Byte offset of the first record in the source stream.
    #[must_use]
    pub fn start_offset(&self) -> u64 {
        self.start_offset
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if the index holds no samples (built from an empty
    /// stream).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Iterates the sampled `(key, offset)` pairs in stream order.
    pub fn samples(&self) -> impl Iterator<Item = (&str, u64)> {
        self.samples.iter().map(|(k, o)| (k.as_str(), *o))
    }

    /// Smallest sampled key, if any.
    #[must_use]
    pub fn first_key(&self) -> Option<&str> {
        self.samples.first().map(|(k, _)| k.as_str())
    }

    /// Largest sampled key, if any.
    #[must_use]
    pub fn last_key(&self) -> Option<&str> {
        self.samples.last().map(|(k, _)| k.as_str())
    }

    pub(crate) fn key_at(&self, i: usize) -> &str {
        self.samples[i].0.as_str()
    }

    pub(crate) fn offset_at(&self, i: usize) -> u64 {
        self.samples[i].1
    }
}

#[cfg(test)]
mod tests;
