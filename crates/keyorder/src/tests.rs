use super::*;
use std::cmp::Ordering;

// -------------------- Basic ordering --------------------

#[test]
fn identical_keys_are_equal() {
    assert_eq!(compare("a.b.c", "a.b.c"), Ordering::Equal);
    assert_eq!(compare("", ""), Ordering::Equal);
}

#[test]
fn numeric_fields_compare_by_value() {
    // "2" < "10" numerically even though "10" < "2" byte-wise
    assert_eq!(compare("run.2", "run.10"), Ordering::Less);
    assert_eq!(compare("run.10", "run.2"), Ordering::Greater);
}

#[test]
fn non_numeric_fields_compare_bytewise() {
    // with a letter mixed in, "10x" < "2x" holds byte-wise
    assert_eq!(compare("run.10x", "run.2x"), Ordering::Less);
    assert_eq!(compare("abc", "abd"), Ordering::Less);
}

#[test]
fn mixed_numeric_and_text_field_is_bytewise() {
    // one side non-numeric forces byte-wise comparison for that position
    assert_eq!(compare("a.2", "a.1x"), Ordering::Greater);
}

#[test]
fn both_separators_are_equivalent() {
    assert_eq!(compare("a:1:2", "a.1.2"), Ordering::Equal);
    assert_eq!(compare("a:1.3", "a.1:2"), Ordering::Greater);
}

#[test]
fn leading_zeros_do_not_matter_numerically() {
    assert_eq!(compare("x.007", "x.7"), Ordering::Equal);
    assert_eq!(compare("x.007", "x.8"), Ordering::Less);
}

#[test]
fn digit_runs_longer_than_u64_still_compare() {
    let small = "k.99999999999999999999999999999998";
    let big = "k.99999999999999999999999999999999";
    assert_eq!(compare(small, big), Ordering::Less);
    assert_eq!(compare(big, small), Ordering::Greater);
}

// -------------------- Field-count policy --------------------

#[test]
fn shorter_field_sequence_sorts_first() {
    assert_eq!(compare("a.1", "a.1.1"), Ordering::Less);
    assert_eq!(compare("a.1.1", "a.1"), Ordering::Greater);
}

#[test]
fn prefix_difference_wins_over_length() {
    // first differing field decides before the length policy applies
    assert_eq!(compare("a.2", "a.1.9.9"), Ordering::Greater);
}

// -------------------- Order laws --------------------

#[test]
fn antisymmetric_over_sample_pairs() {
    let keys = [
        "m01.1.5", "m01.1.50", "m01.2.5", "m01:10:1", "m02.1.1", "x", "x.0",
        "x.1", "y:2:3",
    ];
    for a in &keys {
        for b in &keys {
            let ab = compare(a, b);
            let ba = compare(b, a);
            assert_eq!(ab, ba.reverse(), "compare({a}, {b}) vs compare({b}, {a})");
        }
    }
}

#[test]
fn transitive_over_sorted_triples() {
    let sorted = ["a.1", "a.2", "a.10", "a.10.1", "b.1", "b:1:0"];
    for i in 0..sorted.len() {
        for j in i..sorted.len() {
            for k in j..sorted.len() {
                assert_ne!(compare(sorted[i], sorted[j]), Ordering::Greater);
                assert_ne!(compare(sorted[j], sorted[k]), Ordering::Greater);
                assert_ne!(
                    compare(sorted[i], sorted[k]),
                    Ordering::Greater,
                    "{} .. {} .. {}",
                    sorted[i],
                    sorted[j],
                    sorted[k]
                );
            }
        }
    }
}

#[test]
fn in_order_accepts_equal_and_ascending() {
    assert!(in_order("a.1", "a.1"));
    assert!(in_order("a.1", "a.2"));
    assert!(!in_order("a.2", "a.1"));
}
