//! Report sink — the one-way side channel that records what a handler
//! actually did.
//!
//! One pipe-delimited line per executed command, appended to a dedicated
//! log file that grows until something external rotates or uploads it.
//! Reporting is best-effort by design: a dead log file must never take a
//! running timeline down with it.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::Utc;
use wraith_core::{ReportItem, Result, TimelineRecord, WraithError};

/// Tag at the head of every report line.
pub const LINE_PREFIX: &str = "TIMELINE";

/// Append-only, mutex-serialized report log. Shared by every handler task
/// in the process; the lock keeps concurrent lines from interleaving.
pub struct ReportSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl ReportSink {
    /// Open (or create) the report log, creating parent directories.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| {
                WraithError::Report(format!("Failed to open report log {}: {e}", path.display()))
            })?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one record: `TIMELINE|<UTC RFC3339>|<json>`.
    ///
    /// Never propagates failure — formatting and IO errors are logged and
    /// dropped. At-most-once, no retries.
    pub fn report(&self, item: &ReportItem) {
        if let Err(e) = self.try_report(item) {
            tracing::warn!("⚠️ Dropping report line for {}: {e}", item.handler);
        }
    }

    fn try_report(&self, item: &ReportItem) -> Result<()> {
        let record = TimelineRecord::from(item);
        let json = serde_json::to_string(&record)?;
        let line = format!("{LINE_PREFIX}|{}|{json}\n", Utc::now().to_rfc3339());
        let mut file = self
            .file
            .lock()
            .map_err(|_| WraithError::Report("report log lock poisoned".into()))?;
        file.write_all(line.as_bytes())?;
        Ok(())
    }
}
