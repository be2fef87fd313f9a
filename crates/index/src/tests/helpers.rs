use std::path::Path;

use stream::{StreamReader, StreamWriter};

/// Writes a record stream at `path` with the given `(key, payload)` entries.
pub fn write_stream(path: &Path, entries: &[(&str, &[u8])]) {
    let mut w = StreamWriter::create(path).unwrap();
    for (key, payload) in entries {
        w.append(key, payload).unwrap();
    }
    w.finish().unwrap();
}

/// Writes a stream of single-occurrence records with the given keys; each
/// payload is the key itself.
pub fn write_keys(path: &Path, keys: &[&str]) {
    let mut w = StreamWriter::create(path).unwrap();
    for key in keys {
        w.append(key, key.as_bytes()).unwrap();
    }
    w.finish().unwrap();
}

pub fn open(path: &Path) -> StreamReader {
    StreamReader::open(path).unwrap()
}
