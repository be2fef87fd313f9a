///! # Key Order
///!
///! The total ordering used for sorting and searching record keys.
///!
///! Keys are opaque string tokens built from fields separated by `.` or `:`
///! (both separators are treated identically). Two keys are compared field by
///! field, left to right: a pair of fields that are both all-digits compares
///! as unsigned integers, any other pair compares byte-wise. The first
///! differing position decides.
///!
///! Every component of the workspace assumes streams are sorted under exactly
///! this ordering -- the index builder verifies it, the query engine searches
///! by it.
///!
///! ## Example
///!
///! ```rust
///! use std::cmp::Ordering;
///! use keyorder::compare;
///!
///! // numeric fields compare by value, not byte-wise
///! assert_eq!(compare("run.2", "run.10"), Ordering::Less);
///! // non-numeric fields compare byte-wise
///! assert_eq!(compare("run.b", "run.a10"), Ordering::Greater);
///! ```
use std::cmp::Ordering;

/// Compares two keys under the field-wise ordering.
///
/// Literally identical keys are equal without tokenization. Otherwise both
/// keys are split on `.` and `:` and compared field by field; the first
/// position where the fields differ decides. If one key runs out of fields
/// while the common prefix is equal, the shorter key sorts first (a missing
/// field sorts before any present field).
#[must_use]
pub fn compare(a: &str, b: &str) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }

    let mut fields_a = a.split(is_separator);
    let mut fields_b = b.split(is_separator);

    loop {
        match (fields_a.next(), fields_b.next()) {
            (Some(fa), Some(fb)) => {
                let ord = compare_field(fa, fb);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (None, None) => return Ordering::Equal,
        }
    }
}

/// Returns `true` if `prev` may precede `next` in a sorted stream.
#[must_use]
pub fn in_order(prev: &str, next: &str) -> bool {
    compare(prev, next) != Ordering::Greater
}

fn is_separator(c: char) -> bool {
    c == '.' || c == ':'
}

/// Compares a single pair of fields: numerically when both are all-digits
/// (and non-empty), byte-wise otherwise.
fn compare_field(a: &str, b: &str) -> Ordering {
    if is_numeric(a) && is_numeric(b) {
        compare_numeric(a, b)
    } else {
        a.as_bytes().cmp(b.as_bytes())
    }
}

fn is_numeric(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|c| c.is_ascii_digit())
}

/// Compares two all-digit fields as unsigned integers of arbitrary length.
///
/// Leading zeros are skipped, then the longer remaining run is the larger
/// number; equal-length runs compare byte-wise. This never overflows, so
/// digit runs longer than a `u64` are handled the same as short ones.
fn compare_numeric(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests;
