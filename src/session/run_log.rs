//! The run log file shared by every stage.

use crate::error::{ErrorExt, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Append-mode writer for `build/build-server.log`.
///
/// The file is truncated when the run starts. Write failures are reported
/// through the `log` facade and never abort the run.
#[derive(Debug)]
pub struct RunLog {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl RunLog {
    /// Creates (or truncates) the log at `path`, creating parent directories.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).fs_context("creating log directory", parent)?;
        }
        let file = File::create(path).fs_context("creating run log", path)?;
        Ok(Self {
            path: path.to_path_buf(),
            writer: BufWriter::new(file),
        })
    }

    /// Path of the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Writes one line, appending a newline when missing.
    pub fn write_line(&mut self, line: &str) {
        let result = if line.ends_with('\n') {
            self.writer.write_all(line.as_bytes())
        } else {
            writeln!(self.writer, "{line}")
        };
        if let Err(e) = result {
            log::warn!("Failed to write to {}: {}", self.path.display(), e);
        }
    }

    /// Flushes buffered lines to disk.
    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush().fs_context("flushing run log", &self.path)
    }

    /// Flushes, then reopens the same file in append mode.
    ///
    /// Used after the log was uploaded mid-run so later lines keep
    /// accumulating in the same file.
    pub fn reopen(&mut self) -> Result<()> {
        self.flush()?;
        let file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .fs_context("reopening run log", &self.path)?;
        self.writer = BufWriter::new(file);
        Ok(())
    }
}

impl Drop for RunLog {
    fn drop(&mut self) {
        if let Err(e) = self.writer.flush() {
            log::warn!("Failed to flush {}: {}", self.path.display(), e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_survive_reopen_and_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build").join("build-server.log");

        let mut log = RunLog::create(&path).unwrap();
        log.write_line("first");
        log.write_line("second\n");
        log.reopen().unwrap();
        log.write_line("third");
        drop(log);

        let contents = std::fs::read_to_string(&path).unwrap();
        assert_eq!(contents, "first\nsecond\nthird\n");
    }

    #[test]
    fn create_truncates_previous_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build-server.log");
        std::fs::write(&path, "stale\n").unwrap();

        let mut log = RunLog::create(&path).unwrap();
        log.write_line("fresh");
        log.flush().unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh\n");
    }
}
