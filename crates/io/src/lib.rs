// File I/O operations

pub mod csv;
pub mod json;
pub mod report;
pub mod xlsx;

use std::fmt;
use std::path::Path;

use intake_core::RecordBatch;

/// Raw file formats accepted by the loader, detected purely by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Json,
    Xlsx,
    Csv,
}

impl SourceFormat {
    /// Extensions accepted for raw files (lower-case, without the dot).
    pub const EXTENSIONS: [&'static str; 3] = ["xlsx", "csv", "json"];

    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "json" => Some(Self::Json),
            "xlsx" => Some(Self::Xlsx),
            "csv" => Some(Self::Csv),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Json => write!(f, "json"),
            Self::Xlsx => write!(f, "xlsx"),
            Self::Csv => write!(f, "csv"),
        }
    }
}

/// Why a raw file produced no batch.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadError {
    /// Extension is not one of the supported formats.
    Unsupported(String),
    /// The file could not be read or parsed.
    Parse(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(ext) => write!(f, "unsupported extension: {ext:?}"),
            Self::Parse(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for LoadError {}

/// Load a raw file into a record batch, choosing the reader by extension.
pub fn load(path: &Path) -> Result<RecordBatch, LoadError> {
    let format = SourceFormat::from_path(path).ok_or_else(|| {
        LoadError::Unsupported(
            path.extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default(),
        )
    })?;

    let result = match format {
        SourceFormat::Json => self::json::import(path),
        SourceFormat::Xlsx => self::xlsx::import(path),
        SourceFormat::Csv => self::csv::import(path),
    };
    result.map_err(LoadError::Parse)
}
