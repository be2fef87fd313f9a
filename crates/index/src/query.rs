//! Query path: bracket search, region scans, and match expansion.
//!
//! A lookup touches the stream only inside the bracket the sample search
//! resolves, so the worst case reads two chunk-sized regions. Equal-key runs
//! are contiguous in a correctly sorted stream; the expansion scans stop at
//! the first non-matching key in each direction and do not re-validate
//! contiguity.

use std::cmp::Ordering;

use keyorder::compare;
use stream::{Record, StreamReader};

use crate::{IndexError, SparseIndex};

/// Retrieves every record of the stream whose key equals `key`, in original
/// stream order.
///
/// Keys outside the sampled bounds (and any query against a zero-sample
/// index) return an empty vec without touching the stream. A mismatch
/// between index and stream (a sampled offset whose record disagrees with
/// the sample, or a bracketed region without the key) also degrades to an
/// empty vec rather than an error.
///
/// # Errors
///
/// Returns an error only when the stream itself fails to read.
pub fn lookup(
    reader: &mut StreamReader,
    key: &str,
    index: &SparseIndex,
) -> Result<Vec<Record>, IndexError> {
    let n = index.len();
    if n == 0 {
        return Ok(Vec::new());
    }

    // Provably absent: outside the sampled key span.
    if compare(key, index.key_at(0)) == Ordering::Less
        || compare(key, index.key_at(n - 1)) == Ordering::Greater
    {
        return Ok(Vec::new());
    }

    // Bracket search. Sample keys are strictly increasing, so Ok is the
    // unique exact sample and Err(p) brackets the key between samples p-1
    // and p. The bounds check above pins p to 1..n.
    match index.samples.binary_search_by(|(k, _)| compare(k, key)) {
        Ok(i) => lookup_at_sample(reader, key, index, i),
        Err(p) => lookup_between(reader, key, index, p - 1, p),
    }
}

/// Exact-sample case: the queried key is sample `i`. Seek straight to it,
/// then expand in both directions for duplicate-key records spanning the
/// sampling boundary.
fn lookup_at_sample(
    reader: &mut StreamReader,
    key: &str,
    index: &SparseIndex,
    i: usize,
) -> Result<Vec<Record>, IndexError> {
    let offset = index.offset_at(i);
    reader.seek(offset)?;
    let anchor = match reader.read_record()? {
        Some(rec) => rec,
        None => return Ok(Vec::new()),
    };
    if compare(&anchor.key, key) != Ordering::Equal {
        // Index points at a record it did not sample: stale or mismatched
        // index. Degrade to no match.
        return Ok(Vec::new());
    }

    // Forward: the equal-key run continuing past the sampled record. The
    // cursor already sits just after the anchor. The run cannot reach the
    // next sample, whose key is strictly greater; past the final sample the
    // run is bounded by end of stream instead (the final record shares this
    // key when the unconditional last sample deduplicated into this one).
    let stop = if i + 1 < index.len() {
        Some(index.offset_at(i + 1))
    } else {
        None
    };
    let mut after = Vec::new();
    loop {
        if let Some(stop) = stop {
            if reader.position()? >= stop {
                break;
            }
        }
        match reader.read_record()? {
            Some(rec) if compare(&rec.key, key) == Ordering::Equal => after.push(rec),
            _ => break,
        }
    }

    // Backward: trailing equal-key records at the end of the previous chunk
    // region, nearest-first, then reversed back into stream order.
    let mut matches = Vec::new();
    if i > 0 {
        let region = scan_region(reader, index.offset_at(i - 1), offset)?;
        let mut tail: Vec<Record> = region
            .into_iter()
            .rev()
            .take_while(|rec| compare(&rec.key, key) == Ordering::Equal)
            .collect();
        tail.reverse();
        matches = tail;
    }

    matches.push(anchor);
    matches.extend(after);
    Ok(matches)
}

/// Straddling case: the key lies strictly between samples `before` and
/// `after`. Materialize that region, binary-search it, and expand outward
/// to the full contiguous run.
fn lookup_between(
    reader: &mut StreamReader,
    key: &str,
    index: &SparseIndex,
    before: usize,
    after: usize,
) -> Result<Vec<Record>, IndexError> {
    let mut region = scan_region(reader, index.offset_at(before), index.offset_at(after))?;

    // The region inherits the stream's sort order. No hit means the key is
    // simply not in the stream (or the index disagrees with it): empty
    // either way.
    let j = match region.binary_search_by(|rec| compare(&rec.key, key)) {
        Ok(j) => j,
        Err(_) => return Ok(Vec::new()),
    };

    let mut start = j;
    while start > 0 && compare(&region[start - 1].key, key) == Ordering::Equal {
        start -= 1;
    }
    let mut end = j + 1;
    while end < region.len() && compare(&region[end].key, key) == Ordering::Equal {
        end += 1;
    }

    Ok(region.drain(start..end).collect())
}

/// Reads exactly the records whose frames begin in `[start, stop)`: seek,
/// read one record unconditionally, then keep reading while the cursor
/// (taken before each read) is still short of `stop`.
fn scan_region(
    reader: &mut StreamReader,
    start: u64,
    stop: u64,
) -> Result<Vec<Record>, IndexError> {
    reader.seek(start)?;
    let mut records = Vec::new();
    match reader.read_record()? {
        Some(rec) => records.push(rec),
        None => return Ok(records),
    }
    while reader.position()? < stop {
        match reader.read_record()? {
            Some(rec) => records.push(rec),
            None => break,
        }
    }
    Ok(records)
}
