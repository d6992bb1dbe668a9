//! Newline-delimited JSON storage backend

use super::merge::merge_records;
use super::traits::{RecordStore, StorageError, StorageResult};
use crate::paper::PaperRecord;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File-backed record store: one JSON object per line, UTF-8.
///
/// Every update rewrites the whole file through a sibling temporary file
/// followed by a rename, so a failed write leaves the previous file intact.
/// The store is not safe against concurrent writers; callers serialize runs.
#[derive(Debug, Clone)]
pub struct JsonlStore {
    path: PathBuf,
}

impl JsonlStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RecordStore for JsonlStore {
    fn load(&self) -> Vec<PaperRecord> {
        load_jsonl(&self.path)
    }

    fn merge_and_persist(&self, new_records: Vec<PaperRecord>) -> StorageResult<usize> {
        let existing = load_jsonl(&self.path);
        let merged = merge_records(existing, new_records);

        let mut buf = Vec::new();
        for record in &merged {
            serde_json::to_writer(&mut buf, record)?;
            buf.push(b'\n');
        }
        write_atomic(&self.path, &buf)?;

        info!(path = %self.path.display(), records = merged.len(), "store updated");
        Ok(merged.len())
    }
}

/// Read a JSONL file into records.
///
/// A missing file is a first run. An unreadable file or a line that is not
/// a record object is logged and skipped; this never fails. Fields inside a
/// record are read leniently (see [`PaperRecord`]).
pub fn load_jsonl(path: &Path) -> Vec<PaperRecord> {
    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no store file yet");
            return Vec::new();
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "store unreadable, treating as empty");
            return Vec::new();
        }
    };

    let mut records = Vec::new();
    for (index, line) in BufReader::new(file).lines().enumerate() {
        let line_no = index + 1;
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!(path = %path.display(), line = line_no, error = %e, "skipping unreadable line");
                continue;
            }
        };
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        match serde_json::from_str::<PaperRecord>(trimmed) {
            Ok(record) => records.push(record),
            Err(e) => {
                let preview: String = trimmed.chars().take(80).collect();
                warn!(
                    path = %path.display(),
                    line = line_no,
                    error = %e,
                    preview = %preview,
                    "skipping malformed store line"
                );
            }
        }
    }
    records
}

/// Replace `path` with `contents` all-or-nothing.
///
/// Parent directories are created as needed. Data goes to `<name>.tmp` in
/// the same directory and is renamed over the target once fully synced.
pub fn write_atomic(path: &Path, contents: &[u8]) -> StorageResult<()> {
    let write_err = |source: std::io::Error| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
    }

    let mut tmp_name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    tmp_name.push(".tmp");
    let tmp_path = path.with_file_name(tmp_name);

    let result = (|| -> std::io::Result<()> {
        let mut file = File::create(&tmp_path)?;
        file.write_all(contents)?;
        file.sync_all()?;
        fs::rename(&tmp_path, path)
    })();

    if let Err(e) = result {
        let _ = fs::remove_file(&tmp_path);
        return Err(write_err(e));
    }
    Ok(())
}
