use crate::wal::Record;
use std::{
    fs::File,
    io::{BufRead, BufReader, Write},
    path::Path,
};

/// Writes `records` as zstd-compressed JSON lines.
pub fn write_snapshot(path: &Path, records: &[Record]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(path)?;
    let mut z = zstd::Encoder::new(file, 3)?;
    for rec in records {
        let line = serde_json::to_string(rec)?;
        z.write_all(line.as_bytes())?;
        z.write_all(b"\n")?;
    }
    z.finish()?.sync_all()
}

pub fn read_snapshot(path: &Path) -> std::io::Result<Vec<Record>> {
    let d = zstd::Decoder::new(File::open(path)?)?;
    let mut out = Vec::new();
    for line in BufReader::new(d).lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str(&line) {
            Ok(rec) => out.push(rec),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "skipping bad snapshot record"),
        }
    }
    Ok(out)
}
