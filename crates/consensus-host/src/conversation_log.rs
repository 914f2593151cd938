//! Append-only JSONL conversation log
//!
//! One [`ConversationEntry`] per line. Malformed lines (for example a
//! partial final write) are skipped on read.

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use consensus_engine::{ConversationEntry, ConversationLog};
use tracing::{debug, warn};

use crate::{HostError, HostResult};

pub struct JsonlConversationLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonlConversationLog {
    /// Open (creating if needed) a log file for appending
    pub fn open(path: impl AsRef<Path>) -> HostResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| HostError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| HostError::Io {
                path: path.clone(),
                source,
            })?;
        debug!(path = %path.display(), "Opened conversation log");
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Every parseable entry in file order
    pub fn read_all(&self) -> HostResult<Vec<ConversationEntry>> {
        read_entries(&self.path)
    }
}

/// Parse a JSONL log, skipping malformed lines
pub fn read_entries(path: &Path) -> HostResult<Vec<ConversationEntry>> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(HostError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
    };

    let mut entries = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|source| HostError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ConversationEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => warn!(line = idx + 1, error = %e, "Skipping malformed log line"),
        }
    }
    Ok(entries)
}

impl ConversationLog for JsonlConversationLog {
    fn append(&self, entry: ConversationEntry) {
        let line = match serde_json::to_string(&entry) {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "Failed to serialize conversation entry");
                return;
            }
        };
        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(file, "{line}") {
            warn!(path = %self.path.display(), error = %e, "Failed to append conversation entry");
        }
    }

    fn recent(&self, limit: usize) -> Vec<ConversationEntry> {
        match self.read_all() {
            Ok(mut entries) => {
                let skip = entries.len().saturating_sub(limit);
                entries.drain(..skip);
                entries
            }
            Err(e) => {
                warn!(error = %e, "Failed to read conversation log");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_reads_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(read_entries(&dir.path().join("none.jsonl")).unwrap().is_empty());
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        let log = JsonlConversationLog::open(&path).unwrap();
        log.append(ConversationEntry::new("a", "b", "code.rust"));
        {
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(file, "{{\"query\": \"trunc").unwrap();
        }
        log.append(ConversationEntry::new("c", "d", ""));

        let entries = log.read_all().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].query, "c");
    }
}
