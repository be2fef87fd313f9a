use crc32fast::Hasher as Crc32;
use tempfile::tempdir;

use crate::tests::helpers::{open, write_keys};
use crate::{build_index, IndexError, SparseIndex, HEADER_BYTES, TRAILER_BYTES};

/// Recomputes the trailing CRC32 after a test mutates blob bytes, so decode
/// exercises the structural checks rather than the checksum.
fn rechecksum(mut bytes: Vec<u8>) -> Vec<u8> {
    let body_len = bytes.len() - TRAILER_BYTES;
    let mut hasher = Crc32::new();
    hasher.update(&bytes[..body_len]);
    let crc = hasher.finalize();
    bytes[body_len..].copy_from_slice(&crc.to_le_bytes());
    bytes
}

fn sample_index() -> SparseIndex {
    let dir = tempdir().unwrap();
    let path = dir.path().join("s.rcs");
    let keys: Vec<String> = (0..57).map(|i| format!("m01.{i}")).collect();
    let refs: Vec<&str> = keys.iter().map(String::as_str).collect();
    write_keys(&path, &refs);
    build_index(&mut open(&path), 10).unwrap()
}

// -------------------- Round trip --------------------

#[test]
fn encode_decode_round_trip() {
    let ix = sample_index();
    let decoded = SparseIndex::decode(&ix.encode()).unwrap();
    assert_eq!(decoded, ix);
}

#[test]
fn empty_index_round_trips() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("s.rcs");
    write_keys(&path, &[]);

    let ix = build_index(&mut open(&path), 3).unwrap();
    let decoded = SparseIndex::decode(&ix.encode()).unwrap();
    assert_eq!(decoded, ix);
    assert!(decoded.is_empty());
}

#[test]
fn save_and_load_round_trip() {
    let dir = tempdir().unwrap();
    let ix = sample_index();

    let path = dir.path().join("records.six");
    ix.save(&path).unwrap();
    let loaded = SparseIndex::load(&path).unwrap();
    assert_eq!(loaded, ix);

    // the atomic write leaves no temp file behind
    let names: Vec<String> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(names.iter().all(|n| !n.ends_with(".tmp")), "{names:?}");
}

// -------------------- Corruption --------------------

#[test]
fn decode_rejects_short_blob() {
    let err = SparseIndex::decode(&[0u8; 7]).unwrap_err();
    assert!(matches!(err, IndexError::Corrupt(_)));
}

#[test]
fn decode_rejects_flipped_bit() {
    let mut bytes = sample_index().encode();
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0x40;
    assert!(matches!(
        SparseIndex::decode(&bytes),
        Err(IndexError::Corrupt(_))
    ));
}

#[test]
fn decode_rejects_truncated_blob() {
    let bytes = sample_index().encode();
    assert!(matches!(
        SparseIndex::decode(&bytes[..bytes.len() - 9]),
        Err(IndexError::Corrupt(_))
    ));
}

#[test]
fn decode_rejects_bad_magic() {
    let mut bytes = sample_index().encode();
    bytes[..4].copy_from_slice(&[0xBA, 0xAD, 0xF0, 0x0D]);
    let err = SparseIndex::decode(&rechecksum(bytes)).unwrap_err();
    assert!(matches!(err, IndexError::Corrupt(_)));
}

#[test]
fn decode_rejects_zero_chunk_size() {
    let mut bytes = sample_index().encode();
    bytes[4..8].copy_from_slice(&0u32.to_le_bytes());
    assert!(matches!(
        SparseIndex::decode(&rechecksum(bytes)),
        Err(IndexError::Corrupt(_))
    ));
}

#[test]
fn decode_rejects_overdeclared_sample_count() {
    // declare one more sample than the blob carries
    let ix = sample_index();
    let mut bytes = ix.encode();
    let n = ix.len() as u64 + 1;
    bytes[16..24].copy_from_slice(&n.to_le_bytes());
    assert!(matches!(
        SparseIndex::decode(&rechecksum(bytes)),
        Err(IndexError::Corrupt(_))
    ));
}

#[test]
fn decode_rejects_underdeclared_sample_count() {
    let ix = sample_index();
    let mut bytes = ix.encode();
    let n = ix.len() as u64 - 1;
    bytes[16..24].copy_from_slice(&n.to_le_bytes());
    assert!(matches!(
        SparseIndex::decode(&rechecksum(bytes)),
        Err(IndexError::Corrupt(_))
    ));
}

#[test]
fn load_missing_file_is_io_error() {
    let err = SparseIndex::load("/tmp/no_such_index.six").unwrap_err();
    assert!(matches!(err, IndexError::Io(_)));
}

#[test]
fn header_constant_matches_layout() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("s.rcs");
    write_keys(&path, &[]);
    let ix = build_index(&mut open(&path), 1).unwrap();
    assert_eq!(ix.encode().len(), HEADER_BYTES + TRAILER_BYTES);
}
