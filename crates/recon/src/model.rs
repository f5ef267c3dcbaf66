use std::path::PathBuf;

use chrono::NaiveDateTime;
use intake_io::report::ReportOutcome;
use serde::Serialize;

use crate::filter::Segment;

// ---------------------------------------------------------------------------
// Per-file outcome
// ---------------------------------------------------------------------------

/// Why a raw file was passed over without producing output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// An organized output with the same stem already exists.
    AlreadyProcessed,
    /// Extension is not xlsx, csv or json.
    UnsupportedFormat,
    /// One or more required columns are missing.
    MissingColumns,
    /// The ID column is not text: this is an organized output fed back in.
    AlreadyNormalized,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AlreadyProcessed => write!(f, "already processed"),
            Self::UnsupportedFormat => write!(f, "unsupported format"),
            Self::MissingColumns => write!(f, "missing columns"),
            Self::AlreadyNormalized => write!(f, "already normalized"),
        }
    }
}

/// Pipeline stage where a file failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Load,
    Clean,
    Write,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load => write!(f, "load"),
            Self::Clean => write!(f, "clean"),
            Self::Write => write!(f, "write"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileOutcome {
    Processed {
        segment: Segment,
        #[serde(flatten)]
        report: ReportOutcome,
    },
    Skipped {
        reason: SkipReason,
        #[serde(skip_serializing_if = "Option::is_none")]
        detail: Option<String>,
    },
    Failed {
        stage: Stage,
        message: String,
    },
}

impl FileOutcome {
    pub fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason, detail: None }
    }

    pub fn is_processed(&self) -> bool {
        matches!(self, Self::Processed { .. })
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Skipped { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileReport {
    pub file: String,
    pub path: PathBuf,
    #[serde(flatten)]
    pub outcome: FileOutcome,
}

// ---------------------------------------------------------------------------
// Run report
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RunCounts {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Everything one reconciliation run did, file by file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub inbox: PathBuf,
    pub started_at: NaiveDateTime,
    pub files: Vec<FileReport>,
}

impl RunReport {
    pub fn new(inbox: PathBuf, started_at: NaiveDateTime) -> Self {
        Self {
            inbox,
            started_at,
            files: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn counts(&self) -> RunCounts {
        let mut counts = RunCounts::default();
        for f in &self.files {
            match f.outcome {
                FileOutcome::Processed { .. } => counts.processed += 1,
                FileOutcome::Skipped { .. } => counts.skipped += 1,
                FileOutcome::Failed { .. } => counts.failed += 1,
            }
        }
        counts
    }

    pub fn file(&self, name: &str) -> Option<&FileReport> {
        self.files.iter().find(|f| f.file == name)
    }
}
