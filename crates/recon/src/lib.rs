//! `intake-recon`: the intake and reconciliation pipeline.
//!
//! Raw client files are validated, cleaned, filtered to the active segment,
//! summarized by contract type and written out as organized and summary
//! workbooks. The driver walks the inbox and records what happened to each
//! file in a `RunReport`; every event is appended to the `Journal`.

pub mod aggregate;
pub mod bootstrap;
pub mod clean;
pub mod driver;
pub mod error;
pub mod filter;
pub mod journal;
pub mod marker;
pub mod model;
pub mod schema;
pub mod submit;

pub use aggregate::{summarize, ContractSummary, ContractTotal};
pub use bootstrap::{bootstrap, Readiness};
pub use driver::{organized_outputs, pending_files, process_file, reconcile};
pub use error::{CleanError, DriverError, SubmitError};
pub use filter::{active_subset, select_segment, Segment};
pub use journal::{Journal, JournalEntry};
pub use marker::ProcessedMarker;
pub use model::{FileOutcome, FileReport, RunCounts, RunReport, SkipReason, Stage};
pub use submit::{submit, SubmitOutcome};
