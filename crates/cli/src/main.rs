///! # CLI - Shoal command-line tool
///!
///! Thin command surface over the record stream and sparse index crates.
///! One subcommand per pipeline stage, so a full session is:
///!
///! ```text
///! $ shoal import reads.txt reads.rcs
///! $ shoal sort reads.rcs reads.sorted.rcs
///! $ shoal build reads.sorted.rcs reads.six
///! $ shoal get reads.sorted.rcs reads.six m01.4823
///! ```
///!
///! ## Commands
///!
///! ```text
///! import <text> <records>       one record per line: key<TAB>payload
///! sort <records-in> <records-out>
///! build <records> <index>       build the sparse index
///! get <records> <index> <key>   print matching records, "(none)" if absent
///! stats <index>                 print chunk size, sample count, key span
///! ```
///!
///! ## Configuration
///!
///! ```text
///! SHOAL_CHUNK   sampling interval for `build`   (default: 1024)
///! ```
///!
///! `get` warns on stderr when the records file is newer than the index
///! (stale index); the lookup still runs.

use anyhow::{bail, Context, Result};
use index::{build_index, lookup, SparseIndex};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use stream::{sort_stream, StreamReader, StreamWriter};

/// Reads a configuration value from the environment, falling back to `default`.
fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn usage() -> ! {
    eprintln!("usage: shoal <command> [args]");
    eprintln!("  import <text> <records>        one record per line: key<TAB>payload");
    eprintln!("  sort <records-in> <records-out>");
    eprintln!("  build <records> <index>        chunk size via SHOAL_CHUNK (default 1024)");
    eprintln!("  get <records> <index> <key>");
    eprintln!("  stats <index>");
    std::process::exit(2);
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(cmd) = args.first() else { usage() };

    match (cmd.as_str(), &args[1..]) {
        ("import", [text, records]) => cmd_import(Path::new(text), Path::new(records)),
        ("sort", [src, dst]) => {
            sort_stream(src, dst).context("sort failed")?;
            println!("OK");
            Ok(())
        }
        ("build", [records, index_path]) => cmd_build(Path::new(records), Path::new(index_path)),
        ("get", [records, index_path, key]) => {
            cmd_get(Path::new(records), Path::new(index_path), key)
        }
        ("stats", [index_path]) => cmd_stats(Path::new(index_path)),
        _ => usage(),
    }
}

/// Converts a text file (one `key<TAB>payload` line per record) into a
/// record stream.
fn cmd_import(text: &Path, records: &Path) -> Result<()> {
    let input = File::open(text).with_context(|| format!("cannot open {}", text.display()))?;
    let mut w = StreamWriter::create(records)?;

    let mut count: u64 = 0;
    for line in BufReader::new(input).lines() {
        let line = line?;
        if line.is_empty() {
            continue;
        }
        let (key, payload) = match line.split_once('\t') {
            Some((k, p)) => (k, p),
            None => (line.as_str(), ""),
        };
        w.append(key, payload.as_bytes())?;
        count += 1;
    }
    w.finish()?;

    println!("imported {count} records into {}", records.display());
    Ok(())
}

fn cmd_build(records: &Path, index_path: &Path) -> Result<()> {
    let chunk_size: u32 = env_or("SHOAL_CHUNK", "1024")
        .parse()
        .context("SHOAL_CHUNK must be a positive integer")?;
    if chunk_size == 0 {
        bail!("SHOAL_CHUNK must be a positive integer");
    }

    let mut reader = StreamReader::open(records)
        .with_context(|| format!("cannot open {}", records.display()))?;
    let ix = build_index(&mut reader, chunk_size).context("build failed")?;
    if ix.is_empty() {
        eprintln!("warning: {} holds no records; the index is empty", records.display());
    }
    ix.save(index_path).context("cannot write index")?;

    println!(
        "indexed {} samples (chunk={}) into {}",
        ix.len(),
        chunk_size,
        index_path.display()
    );
    Ok(())
}

fn cmd_get(records: &Path, index_path: &Path, key: &str) -> Result<()> {
    warn_if_stale(records, index_path);

    let ix = SparseIndex::load(index_path)
        .with_context(|| format!("cannot load {}", index_path.display()))?;
    let mut reader = StreamReader::open(records)
        .with_context(|| format!("cannot open {}", records.display()))?;

    let hits = lookup(&mut reader, key, &ix).context("lookup failed")?;
    if hits.is_empty() {
        println!("(none)");
    } else {
        for rec in &hits {
            println!("{}\t{}", rec.key, String::from_utf8_lossy(&rec.payload));
        }
        println!("({} records)", hits.len());
    }
    Ok(())
}

fn cmd_stats(index_path: &Path) -> Result<()> {
    let ix = SparseIndex::load(index_path)
        .with_context(|| format!("cannot load {}", index_path.display()))?;
    println!("chunk_size: {}", ix.chunk_size());
    println!("start_offset: {}", ix.start_offset());
    println!("samples: {}", ix.len());
    match (ix.first_key(), ix.last_key()) {
        (Some(first), Some(last)) => println!("span: {first} .. {last}"),
        _ => println!("span: (empty)"),
    }
    Ok(())
}

/// Advisory staleness check: an index older than its records file still
/// serves lookups, but the operator should rebuild.
fn warn_if_stale(records: &Path, index_path: &Path) {
    let mtime = |p: &Path| std::fs::metadata(p).and_then(|m| m.modified()).ok();
    if let (Some(rec_time), Some(ix_time)) = (mtime(records), mtime(index_path)) {
        if rec_time > ix_time {
            eprintln!(
                "warning: {} is newer than {}; the index may be stale, consider rebuilding",
                records.display(),
                index_path.display()
            );
        }
    }
}
