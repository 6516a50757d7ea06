//! Output files
//!
//! Entries are appended one line each to a daily file grouped under a
//! monthly directory: `<root>/<MM-YYYY>/log-<MM-DD-YYYY>.txt`.

use std::fs::{self, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, TimeZone};

use crate::types::LogEntry;
use crate::utils::{day_file_name, month_dir_name};

/// Destination for ordered page entries
pub trait EntrySink: Send {
    /// Append every entry; on error nothing is assumed durable
    fn append(&mut self, entries: &[LogEntry]) -> io::Result<()>;
}

/// Collects lines in memory
impl EntrySink for Vec<String> {
    fn append(&mut self, entries: &[LogEntry]) -> io::Result<()> {
        self.extend(entries.iter().map(|e| e.line.clone()));
        Ok(())
    }
}

/// Appends entries to a single text file
#[derive(Debug, Clone)]
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl EntrySink for FileSink {
    fn append(&mut self, entries: &[LogEntry]) -> io::Result<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut writer = BufWriter::new(file);
        for entry in entries {
            writer.write_all(entry.line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
        writer.get_ref().sync_data()
    }
}

/// Calendar layout of the export directory
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Output file for the day containing `ts`
    pub fn path_for<Tz: TimeZone>(&self, ts: &DateTime<Tz>) -> PathBuf {
        self.root.join(month_dir_name(ts)).join(day_file_name(ts))
    }

    /// Like [`path_for`](Self::path_for), creating the month directory
    pub fn prepare<Tz: TimeZone>(&self, ts: &DateTime<Tz>) -> io::Result<PathBuf> {
        let path = self.path_for(ts);
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use tempfile::TempDir;

    fn entry(line: &str) -> LogEntry {
        LogEntry::new(Utc::now(), line)
    }

    #[test]
    fn test_file_sink_appends_lines() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");
        let mut sink = FileSink::new(&path);

        sink.append(&[entry("one"), entry("two")]).unwrap();
        sink.append(&[entry("three")]).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "one\ntwo\nthree\n");
    }

    #[test]
    fn test_empty_append_does_not_create_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("out.txt");

        FileSink::new(&path).append(&[]).unwrap();

        assert!(!path.exists());
    }

    #[test]
    fn test_missing_directory_is_an_error() {
        let dir = TempDir::new().unwrap();
        let mut sink = FileSink::new(dir.path().join("absent").join("out.txt"));

        assert!(sink.append(&[entry("x")]).is_err());
    }

    #[test]
    fn test_layout_paths() {
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path());
        let ts = Utc.with_ymd_and_hms(2024, 11, 3, 8, 0, 0).unwrap();

        let path = layout.prepare(&ts).unwrap();

        assert_eq!(path, dir.path().join("11-2024").join("log-11-03-2024.txt"));
        assert!(dir.path().join("11-2024").is_dir());
    }
}
