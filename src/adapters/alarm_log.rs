use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::app::render::alarm_block;
use crate::domain::models::Alarm;

pub const LOG_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Append-only text log of fetched alarms.
#[derive(Debug, Clone)]
pub struct AlarmLogFile {
    path: PathBuf,
}

impl AlarmLogFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns whether anything was written; an empty list leaves the file untouched.
    pub fn append(&self, alarms: &[Alarm]) -> std::io::Result<bool> {
        self.append_at(alarms, Local::now())
    }

    fn append_at(&self, alarms: &[Alarm], at: DateTime<Local>) -> std::io::Result<bool> {
        if alarms.is_empty() {
            return Ok(false);
        }

        let mut entry = format!(
            "=== Alarm log at {} ===\n",
            at.format(LOG_TIMESTAMP_FORMAT)
        );
        for alarm in alarms {
            entry.push_str(&alarm_block(alarm));
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(entry.as_bytes())?;

        tracing::debug!(
            path = %self.path.display(),
            alarms = alarms.len(),
            "appended alarms to log"
        );
        Ok(true)
    }
}
