//! Reconciliation driver: walks the raw inbox and runs each new file
//! through load, schema check, cleaning, filtering, aggregation and report
//! writing. Per-file failures are recorded and never stop the batch.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::Local;
use intake_config::{EmptyInboxPolicy, Layout};
use intake_io::{report, LoadError};

use crate::aggregate::summarize;
use crate::error::{CleanError, DriverError};
use crate::filter::active_subset;
use crate::journal::Journal;
use crate::marker::{is_hidden, stem_of, ProcessedMarker};
use crate::model::{FileOutcome, FileReport, RunReport, SkipReason, Stage};
use crate::{clean, schema};

const SEPARATOR: &str = "----------------------------------------";

/// Process every raw file that has no organized output yet.
pub fn reconcile(
    layout: &Layout,
    policy: EmptyInboxPolicy,
    journal: &mut Journal,
) -> Result<RunReport, DriverError> {
    let mut run = RunReport::new(layout.inbox.clone(), Local::now().naive_local());

    let marker = ProcessedMarker::scan(&layout.organized).map_err(|e| DriverError::Io {
        path: layout.organized.clone(),
        message: e.to_string(),
    })?;
    let files = inbox_files(&layout.inbox)?;

    if files.is_empty() {
        journal.warn(format!(
            "Inbox {} is empty; no file will be processed",
            layout.inbox.display()
        ));
        return match policy {
            EmptyInboxPolicy::Abort => Err(DriverError::EmptyInbox(layout.inbox.clone())),
            EmptyInboxPolicy::Warn => Ok(run),
        };
    }

    // Stems written during this run
    let mut written: HashSet<String> = HashSet::new();

    for path in files {
        let file = file_name(&path);
        let stem = stem_of(&path);

        let outcome = if marker.contains(&stem) || written.contains(&stem) {
            journal.debug(format!("{file} already processed, skipping"));
            FileOutcome::skipped(SkipReason::AlreadyProcessed)
        } else {
            journal.info(SEPARATOR);
            journal.info(format!("Current file: {file}"));
            let outcome = process_file(&path, &stem, layout, journal);
            if outcome.is_processed() {
                written.insert(stem);
            }
            outcome
        };

        run.files.push(FileReport { file, path, outcome });
    }

    let counts = run.counts();
    journal.info(format!(
        "Run finished: {} processed, {} skipped, {} failed",
        counts.processed, counts.skipped, counts.failed
    ));
    Ok(run)
}

/// Run one raw file through the pipeline, writing `<stem>.xlsx` into the
/// organized and reports directories.
pub fn process_file(path: &Path, stem: &str, layout: &Layout, journal: &mut Journal) -> FileOutcome {
    let file = file_name(path);

    let batch = match intake_io::load(path) {
        Ok(batch) => batch,
        Err(LoadError::Unsupported(ext)) => {
            journal.warn(format!("Unsupported extension {ext:?}: {file}"));
            return FileOutcome::Skipped {
                reason: SkipReason::UnsupportedFormat,
                detail: Some(ext),
            };
        }
        Err(LoadError::Parse(message)) => {
            journal.error(format!("Failed to load {file}: {message}"));
            return FileOutcome::Failed { stage: Stage::Load, message };
        }
    };

    let missing = schema::missing_columns(&batch);
    if !missing.is_empty() {
        let detail = missing.join(", ");
        journal.warn(format!("Missing columns in {file}: {detail}. Skipping"));
        return FileOutcome::Skipped {
            reason: SkipReason::MissingColumns,
            detail: Some(detail),
        };
    }

    let cleaned = match clean::clean(batch) {
        Ok(cleaned) => cleaned,
        Err(e @ CleanError::AlreadyNormalized { .. }) => {
            journal.warn(format!("{file} was already analysed ({e}). Skipping"));
            return FileOutcome::Skipped {
                reason: SkipReason::AlreadyNormalized,
                detail: Some(e.to_string()),
            };
        }
        Err(e) => {
            journal.error(format!("Failed to clean {file}: {e}"));
            return FileOutcome::Failed {
                stage: Stage::Clean,
                message: e.to_string(),
            };
        }
    };

    let (segment, active) = active_subset(&cleaned);
    journal.debug(format!("{file}: {segment} rule selected"));
    let summary = summarize(&active);

    let organized_path = layout.organized.join(format!("{stem}.xlsx"));
    let summary_path = layout.reports.join(format!("{stem}.xlsx"));

    match report::write_reports(&active, &summary.to_batch(), &organized_path, &summary_path) {
        Ok(outcome) => {
            journal.info(format!(
                "{file} exported with {} active clients",
                outcome.active_rows
            ));
            if outcome.id_column_found {
                journal.info(format!("{} invalid CPFs highlighted", outcome.highlighted));
            } else {
                journal.warn(format!(
                    "CPF column not found in {}; nothing highlighted",
                    organized_path.display()
                ));
            }
            FileOutcome::Processed { segment, report: outcome }
        }
        Err(message) => {
            journal.error(format!("Failed to write reports for {file}: {message}"));
            FileOutcome::Failed { stage: Stage::Write, message }
        }
    }
}

/// Raw files the next run would process.
pub fn pending_files(layout: &Layout) -> Result<Vec<PathBuf>, DriverError> {
    let marker = ProcessedMarker::scan(&layout.organized).map_err(|e| DriverError::Io {
        path: layout.organized.clone(),
        message: e.to_string(),
    })?;
    Ok(inbox_files(&layout.inbox)?
        .into_iter()
        .filter(|p| !marker.contains(&stem_of(p)))
        .collect())
}

/// Organized outputs available for download, sorted by name.
pub fn organized_outputs(layout: &Layout) -> Result<Vec<PathBuf>, DriverError> {
    regular_files(&layout.organized)
}

fn inbox_files(dir: &Path) -> Result<Vec<PathBuf>, DriverError> {
    regular_files(dir)
}

fn regular_files(dir: &Path) -> Result<Vec<PathBuf>, DriverError> {
    let io_err = |e: std::io::Error| DriverError::Io {
        path: dir.to_path_buf(),
        message: e.to_string(),
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && !is_hidden(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
