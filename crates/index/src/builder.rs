//! Single-pass index construction from a sorted stream.

use std::cmp::Ordering;

use keyorder::compare;
use stream::StreamReader;

use crate::{IndexError, SparseIndex};

/// Builds a [`SparseIndex`] by streaming every record of `reader` once.
///
/// The cursor is rewound to the first record, then each record's begin
/// offset is captured before the frame is consumed. Records at ordinals that
/// are multiples of `chunk_size` become samples; after the stream is
/// exhausted the last record is sampled unconditionally (when it already sat
/// on a chunk boundary it is naturally sampled once).
///
/// The sort precondition is verified as a side effect of the pass: any
/// adjacent pair with `compare(prev, next) == Greater` aborts the build.
///
/// An empty stream yields a zero-sample index.
///
/// # Panics
///
/// Panics if `chunk_size` is 0.
///
/// # Errors
///
/// Returns [`IndexError::UnsortedInput`] on an ordering violation, or an
/// I/O / stream error if the pass cannot read the stream to completion.
pub fn build_index(reader: &mut StreamReader, chunk_size: u32) -> Result<SparseIndex, IndexError> {
    assert!(chunk_size > 0, "chunk_size must be > 0");

    let start_offset = reader.data_start();
    reader.seek(start_offset)?;

    let mut samples: Vec<(String, u64)> = Vec::new();
    let mut prev_key: Option<String> = None;
    let mut last: Option<(String, u64)> = None;
    let mut ordinal: u64 = 0;

    while let Some(rec) = reader.read_record()? {
        if let Some(prev) = &prev_key {
            if compare(prev, &rec.key) == Ordering::Greater {
                return Err(IndexError::UnsortedInput {
                    position: ordinal,
                    prev: prev.clone(),
                    next: rec.key,
                });
            }
        }

        if ordinal % u64::from(chunk_size) == 0 {
            push_sample(&mut samples, &rec.key, rec.offset);
        }

        last = Some((rec.key.clone(), rec.offset));
        prev_key = Some(rec.key);
        ordinal += 1;
    }

    // The last record is always indexed, whatever its ordinal.
    if let Some((key, offset)) = last {
        push_sample(&mut samples, &key, offset);
    }

    Ok(SparseIndex {
        chunk_size,
        start_offset,
        samples,
    })
}

/// Appends a sample, keeping sample keys strictly increasing: a sample whose
/// key compares equal to the previous sample's key is skipped (first offset
/// wins).
fn push_sample(samples: &mut Vec<(String, u64)>, key: &str, offset: u64) {
    if let Some((prev, _)) = samples.last() {
        if compare(prev, key) == Ordering::Equal {
            return;
        }
    }
    samples.push((key.to_string(), offset));
}
