// Pipeline settings
// Loaded from intake.toml in the working root; every key is optional.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Default settings file name, looked up in the root directory.
pub const SETTINGS_FILE: &str = "intake.toml";

#[derive(Debug)]
pub enum ConfigError {
    /// The settings file exists but could not be read.
    Read { path: PathBuf, message: String },
    /// TOML parse / deserialization error.
    Parse { path: PathBuf, message: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => {
                write!(f, "cannot read {}: {message}", path.display())
            }
            Self::Parse { path, message } => {
                write!(f, "invalid settings in {}: {message}", path.display())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// What a run does when the raw inbox holds no files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmptyInboxPolicy {
    /// Log a warning and finish with nothing processed (reconciling runs)
    #[default]
    Warn,
    /// Log a warning and fail the run (one-shot runs)
    Abort,
}

impl fmt::Display for EmptyInboxPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Warn => write!(f, "warn"),
            Self::Abort => write!(f, "abort"),
        }
    }
}

/// Directory layout, relative to the root unless absolute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayoutSettings {
    /// Raw inbox (read)
    pub inbox: PathBuf,
    /// Organized outputs (read for reconciliation + write)
    pub organized: PathBuf,
    /// Summary reports and the processing log
    pub reports: PathBuf,
    /// Log file name inside `reports`
    pub log_file: String,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            inbox: PathBuf::from("arquivos").join("brutos"),
            organized: PathBuf::from("arquivos").join("organizados"),
            reports: PathBuf::from("relatorios"),
            log_file: "processamento.log".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunSettings {
    pub empty_inbox: EmptyInboxPolicy,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub layout: LayoutSettings,
    pub run: RunSettings,
}

impl Settings {
    pub fn from_toml(input: &str) -> Result<Self, String> {
        let settings: Settings = toml::from_str(input).map_err(|e| e.to_string())?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<(), String> {
        if self.layout.log_file.trim().is_empty() {
            return Err("layout.log_file must not be empty".into());
        }
        let dirs = [&self.layout.inbox, &self.layout.organized, &self.layout.reports];
        if dirs.iter().any(|d| d.as_os_str().is_empty()) {
            return Err("layout directories must not be empty".into());
        }
        if self.layout.inbox == self.layout.organized {
            return Err("layout.inbox and layout.organized must differ".into());
        }
        Ok(())
    }

    /// Load settings from an explicit file; the file must exist.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_toml(&contents).map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// Load `intake.toml` from the root, falling back to defaults when absent.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(SETTINGS_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Resolve the layout against a root directory.
    pub fn layout(&self, root: &Path) -> Layout {
        let resolve = |p: &Path| if p.is_absolute() { p.to_path_buf() } else { root.join(p) };
        let reports = resolve(self.layout.reports.as_path());
        Layout {
            inbox: resolve(self.layout.inbox.as_path()),
            organized: resolve(self.layout.organized.as_path()),
            log_file: reports.join(&self.layout.log_file),
            reports,
        }
    }
}

/// Concrete directory paths for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub inbox: PathBuf,
    pub organized: PathBuf,
    pub reports: PathBuf,
    pub log_file: PathBuf,
}

impl Layout {
    /// Directories that must exist before a run, in creation order.
    /// Reports come first so the log has somewhere to go.
    pub fn required_dirs(&self) -> [&Path; 3] {
        [self.reports.as_path(), self.inbox.as_path(), self.organized.as_path()]
    }
}
