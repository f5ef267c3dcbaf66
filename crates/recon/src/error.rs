use std::fmt;
use std::path::PathBuf;

use intake_io::SourceFormat;

/// A cleaning step that stopped the file.
#[derive(Debug, Clone, PartialEq)]
pub enum CleanError {
    /// The ID column holds no text, so it was already normalized by an
    /// earlier run. Re-processing such a file is not supported.
    AlreadyNormalized { column: String },
    /// A date cell could not be parsed.
    InvalidDate { row: usize, value: String },
    /// A value cell is not numeric.
    InvalidValue { row: usize, value: String },
}

impl fmt::Display for CleanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyNormalized { column } => {
                write!(f, "column '{column}' is not text; file was already normalized")
            }
            Self::InvalidDate { row, value } => {
                write!(f, "row {row}: cannot parse date '{value}'")
            }
            Self::InvalidValue { row, value } => {
                write!(f, "row {row}: cannot parse value '{value}'")
            }
        }
    }
}

impl std::error::Error for CleanError {}

/// Run-level failures. Per-file problems never surface here.
#[derive(Debug)]
pub enum DriverError {
    /// The inbox is empty and the run policy says to stop.
    EmptyInbox(PathBuf),
    /// A directory could not be listed.
    Io { path: PathBuf, message: String },
}

impl fmt::Display for DriverError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyInbox(path) => {
                write!(f, "inbox {} is empty; nothing to process", path.display())
            }
            Self::Io { path, message } => write!(f, "{}: {message}", path.display()),
        }
    }
}

impl std::error::Error for DriverError {}

/// Why a submitted file was not accepted into the inbox.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitError {
    /// Extension is not xlsx, csv or json.
    NotAllowed(String),
    /// The file could not be loaded.
    Unreadable(String),
    /// Required columns are missing.
    MissingColumns(Vec<String>),
    /// The ID column is not text; the file looks already processed.
    AlreadyNormalized,
    /// Copying into the inbox failed.
    Io(String),
}

impl fmt::Display for SubmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAllowed(name) => {
                let allowed: Vec<String> =
                    SourceFormat::EXTENSIONS.iter().map(|e| format!(".{e}")).collect();
                write!(f, "{name} is not allowed; send {}", allowed.join(", "))
            }
            Self::Unreadable(msg) => write!(f, "cannot read file: {msg}"),
            Self::MissingColumns(cols) => write!(f, "missing columns: {}", cols.join(", ")),
            Self::AlreadyNormalized => write!(f, "file was already processed"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for SubmitError {}
