//! Intake acceptance: the checks a file must pass before it is placed in
//! the raw inbox.

use std::fs;
use std::path::{Path, PathBuf};

use intake_config::Layout;
use intake_io::{LoadError, SourceFormat};

use crate::clean::normalize_ids;
use crate::error::SubmitError;
use crate::schema::missing_columns;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Copied into the inbox at this path.
    Accepted(PathBuf),
    /// A file with the same name is already in the inbox; nothing was written.
    Duplicate(PathBuf),
}

/// Check a file and copy it into the inbox.
///
/// The file must have an allowed extension, load cleanly, carry every
/// required column and have a text ID column. An inbox file with the same
/// name is never overwritten, whatever its content.
pub fn submit(file: &Path, layout: &Layout) -> Result<SubmitOutcome, SubmitError> {
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    if SourceFormat::from_path(file).is_none() {
        return Err(SubmitError::NotAllowed(name));
    }

    let mut batch = intake_io::load(file).map_err(|e| match e {
        LoadError::Unsupported(_) => SubmitError::NotAllowed(name.clone()),
        LoadError::Parse(msg) => SubmitError::Unreadable(msg),
    })?;

    let missing = missing_columns(&batch);
    if !missing.is_empty() {
        return Err(SubmitError::MissingColumns(
            missing.into_iter().map(String::from).collect(),
        ));
    }

    normalize_ids(&mut batch).map_err(|_| SubmitError::AlreadyNormalized)?;

    let target = layout.inbox.join(&name);
    if target.exists() {
        return Ok(SubmitOutcome::Duplicate(target));
    }

    fs::copy(file, &target).map_err(|e| SubmitError::Io(format!("{}: {}", target.display(), e)))?;
    Ok(SubmitOutcome::Accepted(target))
}
