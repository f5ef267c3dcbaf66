//! Append-only processing log.
//!
//! A `Journal` is created by the caller before the first file and handed to
//! the driver by `&mut`. Every entry is timestamped, appended and flushed to
//! the log file straight away, mirrored to the `log` facade for console
//! output, and kept in memory for the run report.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use chrono::{Local, NaiveDateTime};
use log::Level;

#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub at: NaiveDateTime,
    pub level: Level,
    pub message: String,
}

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Error => "ERROR",
        Level::Warn => "WARNING",
        Level::Info => "INFO",
        Level::Debug => "DEBUG",
        Level::Trace => "TRACE",
    }
}

impl JournalEntry {
    /// `YYYY-MM-DD HH:MM:SS,mmm - LEVEL - message`
    pub fn to_line(&self) -> String {
        format!(
            "{} - {} - {}",
            self.at.format("%Y-%m-%d %H:%M:%S,%3f"),
            level_name(self.level),
            self.message
        )
    }
}

pub struct Journal {
    file: Option<File>,
    entries: Vec<JournalEntry>,
    write_failed: bool,
}

impl Journal {
    /// Open (or create) the log file in append mode.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Some(file),
            entries: Vec::new(),
            write_failed: false,
        })
    }

    /// A journal that only mirrors to `log` and keeps entries in memory.
    pub fn in_memory() -> Self {
        Self {
            file: None,
            entries: Vec::new(),
            write_failed: false,
        }
    }

    pub fn debug(&mut self, message: impl Into<String>) {
        self.record(Level::Debug, message.into());
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.record(Level::Info, message.into());
    }

    pub fn warn(&mut self, message: impl Into<String>) {
        self.record(Level::Warn, message.into());
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.record(Level::Error, message.into());
    }

    fn record(&mut self, level: Level, message: String) {
        log::log!(level, "{}", message);

        let entry = JournalEntry {
            at: Local::now().naive_local(),
            level,
            message,
        };

        // The file only carries INFO and above
        if level <= Level::Info {
            if let Some(file) = self.file.as_mut() {
                let written = writeln!(file, "{}", entry.to_line()).and_then(|_| file.flush());
                if let Err(e) = written {
                    if !self.write_failed {
                        log::error!("cannot append to processing log: {}", e);
                        self.write_failed = true;
                    }
                }
            }
        }

        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[JournalEntry] {
        &self.entries
    }

    /// Entries at `level` or more severe.
    pub fn count_at_least(&self, level: Level) -> usize {
        self.entries.iter().filter(|e| e.level <= level).count()
    }

    /// Flush and close the log file, returning what was recorded.
    ///
    /// Fails when any entry could not be appended during the run.
    pub fn finish(mut self) -> io::Result<Vec<JournalEntry>> {
        if let Some(mut file) = self.file.take() {
            file.flush()?;
            file.sync_all()?;
        }
        if self.write_failed {
            return Err(io::Error::new(
                io::ErrorKind::Other,
                "some entries could not be appended",
            ));
        }
        Ok(self.entries)
    }
}
