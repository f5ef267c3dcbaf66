//! Segment selection: which clients end up in the organized report.
//!
//! The rule is chosen from the data itself. A batch with at least one
//! delinquent client reports delinquents above a value floor; any other
//! batch reports high-value cancellations from the reference year.

use chrono::Datelike;
use intake_core::{CellValue, RecordBatch, COL_DATE, COL_STATUS, COL_VALUE};
use serde::Serialize;

/// Status value marking a delinquent client.
pub const STATUS_DELINQUENT: &str = "Inadimplente";
/// Status value marking a cancelled contract.
pub const STATUS_CANCELLED: &str = "Cancelado";

/// Delinquent rows are kept above this value.
pub const DELINQUENT_MIN_VALUE: f64 = 1000.0;
/// Cancelled rows are kept above this value.
pub const CANCELLED_MIN_VALUE: f64 = 4000.0;
/// Cancelled rows are kept only for this contract year.
pub const CANCELLED_YEAR: i32 = 2025;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Segment {
    Delinquent,
    Cancelled,
}

impl std::fmt::Display for Segment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delinquent => write!(f, "delinquent"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

fn status_is(row: &[CellValue], col: Option<usize>, status: &str) -> bool {
    col.and_then(|c| row.get(c))
        .and_then(CellValue::as_text)
        .is_some_and(|s| s == status)
}

fn value_above(row: &[CellValue], col: Option<usize>, floor: f64) -> bool {
    col.and_then(|c| row.get(c))
        .and_then(CellValue::as_number)
        .is_some_and(|v| v > floor)
}

fn in_year(row: &[CellValue], col: Option<usize>, year: i32) -> bool {
    col.and_then(|c| row.get(c))
        .and_then(CellValue::as_datetime)
        .is_some_and(|dt| dt.year() == year)
}

/// Pick the business rule for this batch.
pub fn select_segment(batch: &RecordBatch) -> Segment {
    let status = batch.column_index(COL_STATUS);
    if batch.rows().iter().any(|r| status_is(r, status, STATUS_DELINQUENT)) {
        Segment::Delinquent
    } else {
        Segment::Cancelled
    }
}

/// Rows of a cleaned batch that satisfy the chosen rule.
pub fn active_subset(batch: &RecordBatch) -> (Segment, RecordBatch) {
    let segment = select_segment(batch);
    let status = batch.column_index(COL_STATUS);
    let value = batch.column_index(COL_VALUE);
    let date = batch.column_index(COL_DATE);

    let active = match segment {
        Segment::Delinquent => batch.filtered(|r| {
            status_is(r, status, STATUS_DELINQUENT) && value_above(r, value, DELINQUENT_MIN_VALUE)
        }),
        Segment::Cancelled => batch.filtered(|r| {
            status_is(r, status, STATUS_CANCELLED)
                && value_above(r, value, CANCELLED_MIN_VALUE)
                && in_year(r, date, CANCELLED_YEAR)
        }),
    };
    (segment, active)
}
