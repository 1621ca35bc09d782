//! Append-only transition log.
//!
//! One line per light transition, in local time:
//! `[2024-05-01 18:03:12] Light State: ON`

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Local};

use crate::debounce::LightEvent;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Format a single log line, including the trailing newline.
pub fn format_line(event: LightEvent, at: &DateTime<Local>) -> String {
    format!("[{}] Light State: {}\n", at.format(TIMESTAMP_FORMAT), event)
}

/// Transition log file, opened in append mode for the life of the process.
pub struct Journal {
    path: PathBuf,
    file: File,
}

impl Journal {
    /// Open (creating if needed) the log file for appending.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open transition log {}", path.display()))?;
        Ok(Self { path, file })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one transition and flush it.
    pub fn record(&mut self, event: LightEvent, at: &DateTime<Local>) -> Result<()> {
        self.file
            .write_all(format_line(event, at).as_bytes())
            .and_then(|_| self.file.flush())
            .with_context(|| format!("append to transition log {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2024, 5, 1, h, m, s)
            .single()
            .expect("unambiguous local time")
    }

    #[test]
    fn line_format_matches_log_layout() {
        assert_eq!(
            format_line(LightEvent::On, &at(8, 4, 9)),
            "[2024-05-01 08:04:09] Light State: ON\n"
        );
        assert_eq!(
            format_line(LightEvent::Off, &at(23, 59, 0)),
            "[2024-05-01 23:59:00] Light State: OFF\n"
        );
    }

    #[test]
    fn appends_across_reopen() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("room_log.txt");

        let mut journal = Journal::open(&path)?;
        journal.record(LightEvent::On, &at(12, 0, 0))?;
        drop(journal);

        let mut journal = Journal::open(&path)?;
        journal.record(LightEvent::Off, &at(12, 0, 6))?;

        let contents = std::fs::read_to_string(&path)?;
        assert_eq!(
            contents,
            "[2024-05-01 12:00:00] Light State: ON\n[2024-05-01 12:00:06] Light State: OFF\n"
        );
        Ok(())
    }
}
