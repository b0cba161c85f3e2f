//! Write-ahead log of store mutations.
//!
//! One record per line: `<crc32c as 8 hex digits> <json>`. Replay skips lines whose
//! checksum or JSON does not hold up.

use bookbay_core::{Cart, Message, Order, Session, User};
use crc32c::crc32c;
use serde::{Deserialize, Serialize};
use std::{
    fs::{File, OpenOptions},
    io::{BufRead, BufReader, Write},
    path::{Path, PathBuf},
};
use ulid::Ulid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Record {
    UserPut {
        user: User,
    },
    SessionPut {
        session: Session,
    },
    SessionDelete {
        id: String,
    },
    CartPut {
        user_id: String,
        cart: Cart,
    },
    OrderPut {
        order: Order,
    },
    MessagePut {
        recipient: String,
        message: Message,
    },
    MessageRead {
        user_id: String,
        id: String,
    },
    MessageDelete {
        user_id: String,
        id: String,
    },
}

pub fn encode_line(rec: &Record) -> serde_json::Result<String> {
    let json = serde_json::to_string(rec)?;
    Ok(format!("{:08x} {}\n", crc32c(json.as_bytes()), json))
}

/// Returns None for a torn, corrupt or unparseable line.
pub fn decode_line(line: &str) -> Option<Record> {
    let (crc, json) = line.trim_end().split_once(' ')?;
    let expected = u32::from_str_radix(crc, 16).ok()?;
    if crc32c(json.as_bytes()) != expected {
        return None;
    }
    serde_json::from_str(json).ok()
}

pub struct Wal {
    segment: String,
    file: File,
}

impl Wal {
    /// Starts a fresh segment in `dir`. ULID names keep segments sorted by creation.
    pub fn create(dir: &Path) -> std::io::Result<Self> {
        Self::open(dir, format!("wal-{}.log", Ulid::new()))
    }

    /// Opens `segment` for appending, creating it if needed.
    pub fn open(dir: &Path, segment: String) -> std::io::Result<Self> {
        std::fs::create_dir_all(dir)?;
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(&segment))?;
        Ok(Self { segment, file })
    }

    #[cfg(test)]
    pub(crate) fn from_file(segment: String, file: File) -> Self {
        Self { segment, file }
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn append(&mut self, rec: &Record) -> std::io::Result<()> {
        let line = encode_line(rec)?;
        self.file.write_all(line.as_bytes())?;
        self.file.flush()?;
        Ok(())
    }

    pub fn sync(&self) -> std::io::Result<()> {
        self.file.sync_data()
    }
}

/// Reads every intact record from one segment file.
pub fn replay(path: &Path) -> std::io::Result<Vec<Record>> {
    let fh = File::open(path)?;
    let mut out = Vec::new();
    for (n, line) in BufReader::new(fh).lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match decode_line(&line) {
            Some(rec) => out.push(rec),
            None => tracing::warn!(path = %path.display(), line = n + 1, "skipping corrupt wal record"),
        }
    }
    Ok(out)
}

/// Segment file names in `dir`, oldest first.
pub fn list_segments(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = match std::fs::read_dir(dir) {
        Ok(rd) => rd
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .filter(|n| n.starts_with("wal-") && n.ends_with(".log"))
            .collect(),
        Err(_) => Vec::new(),
    };
    names.sort();
    names
}

pub fn segment_path(dir: &Path, segment: &str) -> PathBuf {
    dir.join(segment)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut wal = Wal::create(dir.path()).unwrap();
        let a = Record::SessionDelete { id: "s1".into() };
        let b = Record::MessageRead {
            user_id: "u1".into(),
            id: "msg_1".into(),
        };
        wal.append(&a).unwrap();
        // flipped checksum
        let bad = encode_line(&Record::SessionDelete { id: "s2".into() })
            .unwrap()
            .replacen(|c: char| c.is_ascii_hexdigit(), "z", 1);
        std::fs::OpenOptions::new()
            .append(true)
            .open(dir.path().join(wal.segment()))
            .unwrap()
            .write_all(format!("{}{{torn json\n", bad).as_bytes())
            .unwrap();
        wal.append(&b).unwrap();

        let recs = replay(&dir.path().join(wal.segment())).unwrap();
        assert_eq!(recs, vec![a, b]);
    }

    #[test]
    fn segments_sort_by_creation() {
        let dir = tempfile::tempdir().unwrap();
        let first = Wal::create(dir.path()).unwrap().segment().to_string();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let second = Wal::create(dir.path()).unwrap().segment().to_string();
        std::fs::write(dir.path().join("notes.txt"), b"x").unwrap();
        assert_eq!(list_segments(dir.path()), vec![first, second]);
    }
}
