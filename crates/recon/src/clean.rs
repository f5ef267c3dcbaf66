//! Row cleaning and normalization.
//!
//! Steps run in a fixed order over every row: drop exact duplicates,
//! title-case names, strip ID formatting, parse dates, coerce values.
//! Each step is a no-op when its column is absent; callers validate the
//! column contract first.

use std::collections::HashSet;

use chrono::{NaiveDate, NaiveDateTime};
use intake_core::{
    digits_only, CellValue, RecordBatch, COL_DATE, COL_NAME, COL_NATIONAL_ID, COL_VALUE,
};

use crate::error::CleanError;

/// A text layout accepted in the date column.
#[derive(Debug, Clone, Copy, PartialEq)]
struct DateLayout {
    format: &'static str,
    with_time: bool,
}

impl DateLayout {
    const fn datetime(format: &'static str) -> Self {
        Self { format, with_time: true }
    }

    const fn date(format: &'static str) -> Self {
        Self { format, with_time: false }
    }

    fn parse(&self, s: &str) -> Option<NaiveDateTime> {
        let s = s.trim();
        if self.with_time {
            NaiveDateTime::parse_from_str(s, self.format).ok()
        } else {
            NaiveDate::parse_from_str(s, self.format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        }
    }
}

/// Preference order: ISO, then day-first, then month-first. A column that
/// reads both ways is taken as day-first.
const LAYOUTS: &[DateLayout] = &[
    DateLayout::datetime("%Y-%m-%d %H:%M:%S"),
    DateLayout::datetime("%Y-%m-%dT%H:%M:%S"),
    DateLayout::datetime("%Y-%m-%d %H:%M:%S%.f"),
    DateLayout::datetime("%Y-%m-%dT%H:%M:%S%.f"),
    DateLayout::datetime("%Y-%m-%d %H:%M"),
    DateLayout::date("%Y-%m-%d"),
    DateLayout::datetime("%Y/%m/%d %H:%M:%S"),
    DateLayout::date("%Y/%m/%d"),
    // day-first
    DateLayout::datetime("%d/%m/%Y %H:%M:%S"),
    DateLayout::datetime("%d/%m/%Y %H:%M"),
    DateLayout::date("%d/%m/%Y"),
    DateLayout::date("%d-%m-%Y"),
    DateLayout::date("%d.%m.%Y"),
    // month-first
    DateLayout::datetime("%m/%d/%Y %H:%M:%S"),
    DateLayout::datetime("%m/%d/%Y %H:%M"),
    DateLayout::date("%m/%d/%Y"),
    DateLayout::date("%m-%d-%Y"),
    DateLayout::date("%m.%d.%Y"),
];

/// Run every cleaning step in order.
pub fn clean(mut batch: RecordBatch) -> Result<RecordBatch, CleanError> {
    drop_duplicates(&mut batch);
    title_case_names(&mut batch);
    normalize_ids(&mut batch)?;
    parse_dates(&mut batch)?;
    coerce_values(&mut batch)?;
    Ok(batch)
}

/// Remove rows equal to an earlier row in every column.
pub fn drop_duplicates(batch: &mut RecordBatch) {
    let mut seen: HashSet<Vec<String>> = HashSet::new();
    batch.retain_rows(|row| seen.insert(row.iter().map(CellValue::identity_key).collect()));
}

/// Upper-case the first letter of every alphabetic run, lower-case the rest.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

pub fn title_case_names(batch: &mut RecordBatch) {
    let Some(col) = batch.column_index(COL_NAME) else {
        return;
    };
    for row in batch.rows_mut() {
        if let CellValue::Text(name) = &row[col] {
            row[col] = CellValue::Text(title_case(name));
        }
    }
}

/// Strip non-digits from every ID cell.
///
/// A column without any text cell means a previous run already turned the
/// IDs into numbers; that is reported as `AlreadyNormalized`.
pub fn normalize_ids(batch: &mut RecordBatch) -> Result<(), CleanError> {
    let Some(col) = batch.column_index(COL_NATIONAL_ID) else {
        return Ok(());
    };
    if !batch.is_empty() && !batch.column_values(col).any(CellValue::is_text) {
        return Err(CleanError::AlreadyNormalized {
            column: COL_NATIONAL_ID.to_string(),
        });
    }

    for row in batch.rows_mut() {
        let cell = &row[col];
        if cell.is_empty() {
            row[col] = CellValue::Empty;
            continue;
        }
        row[col] = CellValue::text(digits_only(&cell.display()));
    }
    Ok(())
}

/// Parse a date/timestamp string in the first accepted layout that fits.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    LAYOUTS.iter().find_map(|layout| layout.parse(s))
}

/// The first layout that reads every non-empty text cell in the column.
fn column_layout(batch: &RecordBatch, col: usize) -> Option<DateLayout> {
    let texts: Vec<&str> = batch
        .column_values(col)
        .filter(|cell| !cell.is_empty())
        .filter_map(|cell| match cell {
            CellValue::Text(s) => Some(s.as_str()),
            _ => None,
        })
        .collect();
    if texts.is_empty() {
        return None;
    }
    LAYOUTS
        .iter()
        .copied()
        .find(|layout| texts.iter().all(|s| layout.parse(s).is_some()))
}

/// Parse the date column.
///
/// One layout is chosen for the whole column, so `01/02/2025` next to
/// `12/31/2025` reads as January 2. Cells the column layout cannot read
/// fall back to any accepted layout.
pub fn parse_dates(batch: &mut RecordBatch) -> Result<(), CleanError> {
    let Some(col) = batch.column_index(COL_DATE) else {
        return Ok(());
    };
    let layout = column_layout(batch, col);
    for (idx, row) in batch.rows_mut().iter_mut().enumerate() {
        let parsed = match &row[col] {
            cell if cell.is_empty() => CellValue::Empty,
            CellValue::DateTime(dt) => CellValue::DateTime(*dt),
            CellValue::Text(s) => match layout
                .and_then(|l| l.parse(s))
                .or_else(|| parse_datetime(s))
            {
                Some(dt) => CellValue::DateTime(dt),
                None => {
                    return Err(CleanError::InvalidDate {
                        row: idx + 1,
                        value: s.clone(),
                    })
                }
            },
            other => {
                return Err(CleanError::InvalidDate {
                    row: idx + 1,
                    value: other.display(),
                })
            }
        };
        row[col] = parsed;
    }
    Ok(())
}

pub fn coerce_values(batch: &mut RecordBatch) -> Result<(), CleanError> {
    let Some(col) = batch.column_index(COL_VALUE) else {
        return Ok(());
    };
    for (idx, row) in batch.rows_mut().iter_mut().enumerate() {
        let coerced = match &row[col] {
            cell if cell.is_empty() => CellValue::Empty,
            CellValue::Number(n) => CellValue::Number(*n),
            CellValue::Text(s) => match parse_number(s) {
                Some(n) => CellValue::Number(n),
                None => {
                    return Err(CleanError::InvalidValue {
                        row: idx + 1,
                        value: s.clone(),
                    })
                }
            },
            other => {
                return Err(CleanError::InvalidValue {
                    row: idx + 1,
                    value: other.display(),
                })
            }
        };
        row[col] = coerced;
    }
    Ok(())
}

fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if !s.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}
