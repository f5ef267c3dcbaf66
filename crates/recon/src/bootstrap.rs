//! Directory readiness check run before any file is touched.

use std::fs;
use std::io;
use std::path::PathBuf;

use intake_config::Layout;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "created", rename_all = "snake_case")]
pub enum Readiness {
    /// Every directory already existed.
    Ready,
    /// These directories were missing and have been created. The run must
    /// stop so the operator can fill the inbox and start again.
    Created(Vec<PathBuf>),
}

/// Create any missing layout directory, reporting what was created.
pub fn bootstrap(layout: &Layout) -> io::Result<Readiness> {
    let mut created = Vec::new();
    for dir in layout.required_dirs() {
        if dir.is_dir() {
            continue;
        }
        fs::create_dir_all(dir)?;
        created.push(dir.to_path_buf());
    }

    if created.is_empty() {
        Ok(Readiness::Ready)
    } else {
        Ok(Readiness::Created(created))
    }
}
