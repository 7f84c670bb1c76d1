//! Per-run file logger.
//!
//! Each runner owns one log file for the life of the run. Lines use the
//! format `YYYY-MM-DD HH:MM:SS,mmm [LEVEL] antkeeper.run.<id> - <message>`
//! and are flushed as written so the file is readable mid-run. Nothing here
//! routes through the ambient `tracing` subscriber; run logs are their own
//! sink and do not propagate. Write failures are swallowed; logging must
//! not break the engine.

use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;

/// Dedicated file logger for a single workflow run.
pub struct RunLog {
    name: String,
    file: Mutex<File>,
}

impl RunLog {
    /// Open the log file (create + append) for the given run.
    pub fn create(path: &Path, run_id: &str) -> std::io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            name: format!("antkeeper.run.{run_id}"),
            file: Mutex::new(file),
        })
    }

    fn write_line(&self, level: &str, message: &str) {
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S,%3f");
        let Ok(mut file) = self.file.lock() else {
            return;
        };
        let _ = writeln!(file, "{} [{}] {} - {}", timestamp, level, self.name, message)
            .and_then(|()| file.flush());
    }

    pub fn debug(&self, message: &str) {
        self.write_line("DEBUG", message);
    }

    pub fn info(&self, message: &str) {
        self.write_line("INFO", message);
    }

    pub fn error(&self, message: &str) {
        self.write_line("ERROR", message);
    }
}
