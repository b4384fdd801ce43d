//! Per-run session state: the error ledger and the run log.
//!
//! A single [`Session`] is created at startup and passed by `&mut` through
//! every stage. It is the only owner of the log handle, which is flushed
//! when the session is dropped on every exit path.

mod ledger;
mod run_log;

pub use ledger::ErrorLedger;
pub use run_log::RunLog;

use crate::error::Result;
use std::path::Path;

/// Run-wide mutable state.
#[derive(Debug)]
pub struct Session {
    ledger: ErrorLedger,
    log: RunLog,
}

impl Session {
    /// Opens a fresh run log at `log_path`.
    pub fn create(log_path: &Path) -> Result<Self> {
        Ok(Self {
            ledger: ErrorLedger::new(),
            log: RunLog::create(log_path)?,
        })
    }

    /// Writes an informational line to the console log and the run log.
    pub fn output(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        log::info!("{}", line.trim_end());
        self.log.write_line(line);
    }

    /// Records a failure: appended to the ledger and verbatim to the run log.
    pub fn record(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::error!("Error: {}", message);
        self.log.write_line(&message);
        self.ledger.record(message);
    }

    /// Read access to the ledger.
    pub fn ledger(&self) -> &ErrorLedger {
        &self.ledger
    }

    /// Path of the run log.
    pub fn log_path(&self) -> &Path {
        self.log.path()
    }

    /// Flushes the run log so it can be read from disk.
    pub fn flush_log(&mut self) -> Result<()> {
        self.log.flush()
    }

    /// Reopens the run log in append mode after an upload.
    pub fn reopen_log(&mut self) -> Result<()> {
        self.log.reopen()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_lands_in_ledger_and_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("build-server.log");
        let mut session = Session::create(&path).unwrap();

        session.output("Running AppImageAssistant...");
        session.record("AppImageKit Error: AppImageAssistant did not output the AppImage file");
        session.flush_log().unwrap();

        assert_eq!(session.ledger().len(), 1);
        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("Running AppImageAssistant..."));
        assert!(contents.contains("AppImageKit Error"));
    }
}
