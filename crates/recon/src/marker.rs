//! Processed marker: which raw files already have an organized output.
//!
//! A raw file counts as processed when some file in the organized directory
//! shares its stem. The snapshot is taken once per run.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::Path;

/// File name without its last extension. `dados.2025.csv` gives `dados.2025`.
pub fn stem_of(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

pub(crate) fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with('.'))
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessedMarker {
    stems: BTreeSet<String>,
}

impl ProcessedMarker {
    /// Collect the stems of every regular file in `dir`.
    pub fn scan(dir: &Path) -> io::Result<Self> {
        let mut stems = BTreeSet::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && !is_hidden(&path) {
                stems.insert(stem_of(&path));
            }
        }
        Ok(Self { stems })
    }

    pub fn contains(&self, stem: &str) -> bool {
        self.stems.contains(stem)
    }

    pub fn len(&self) -> usize {
        self.stems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stems.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn stems_strip_last_extension_only() {
        assert_eq!(stem_of(Path::new("a/clientes.csv")), "clientes");
        assert_eq!(stem_of(Path::new("dados.2025.json")), "dados.2025");
        assert_eq!(stem_of(Path::new("semext")), "semext");
    }

    #[test]
    fn scan_collects_file_stems() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("jan.xlsx"), b"x").unwrap();
        fs::write(dir.path().join("fev.xlsx"), b"x").unwrap();
        fs::write(dir.path().join(".jan.xlsx.tmp"), b"x").unwrap();
        fs::create_dir(dir.path().join("mar")).unwrap();

        let marker = ProcessedMarker::scan(dir.path()).unwrap();
        assert_eq!(marker.len(), 2);
        assert!(marker.contains("jan"));
        assert!(marker.contains("fev"));
        assert!(!marker.contains("mar"));
    }

    #[test]
    fn scan_of_missing_dir_fails() {
        let dir = tempdir().unwrap();
        assert!(ProcessedMarker::scan(&dir.path().join("nope")).is_err());
    }
}
