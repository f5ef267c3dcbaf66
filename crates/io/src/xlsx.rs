// Excel file import (first worksheet) and export (xlsx only)
//
// Import: the first row of the used range is the header; typed cells map to
//         CellValue, date-formatted cells become DateTime.
// Export: header row plus one row per record on a single "Sheet1". Optional
//         per-cell fills and per-column widths are layered on top.

use std::collections::HashSet;
use std::path::Path;

use calamine::{open_workbook_auto, Data, Reader};
use chrono::NaiveDateTime;
use intake_core::{CellValue, RecordBatch};
use rust_xlsxwriter::{Color, Format, FormatPattern, Workbook as XlsxWorkbook, Worksheet};

/// Number format used for timestamp cells.
pub const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";

/// Excel serial of the Unix epoch (1970-01-01) in the 1900 date system.
const UNIX_EPOCH_SERIAL: f64 = 25569.0;

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Import the first worksheet of an Excel file
pub fn import(path: &Path) -> Result<RecordBatch, String> {
    let mut workbook = open_workbook_auto(path)
        .map_err(|e| format!("Failed to open Excel file: {}", e))?;

    let sheet_names: Vec<String> = workbook.sheet_names().to_vec();
    let first = sheet_names
        .first()
        .ok_or_else(|| "Excel file contains no sheets".to_string())?;

    let range = workbook
        .worksheet_range(first)
        .map_err(|e| format!("Failed to read sheet '{}': {}", first, e))?;

    let mut rows = range.rows();
    let header = match rows.next() {
        Some(header) => header,
        None => return Err(format!("Sheet '{}' is empty (no header row)", first)),
    };

    let columns: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(idx, cell)| {
            let name = to_cell(cell).display();
            if name.is_empty() {
                format!("Unnamed: {idx}")
            } else {
                name
            }
        })
        .collect();

    let mut batch = RecordBatch::new(columns);
    for row in rows {
        let cells: Vec<CellValue> = row.iter().map(to_cell).collect();
        // Fully blank rows carry no record
        if cells.iter().all(CellValue::is_empty) {
            continue;
        }
        batch.push_row(cells);
    }

    Ok(batch)
}

fn to_cell(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Empty,
        Data::String(s) => CellValue::text(s.as_str()),
        Data::Float(n) => CellValue::Number(*n),
        Data::Int(n) => CellValue::Number(*n as f64),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => match dt.as_datetime() {
            Some(ndt) => CellValue::DateTime(ndt),
            None => CellValue::Number(dt.as_f64()),
        },
        Data::DateTimeIso(s) => parse_iso(s)
            .map(CellValue::DateTime)
            .unwrap_or_else(|| CellValue::text(s.as_str())),
        Data::DurationIso(s) => CellValue::text(s.as_str()),
        Data::Error(e) => CellValue::Text(format!("#{:?}", e)),
    }
}

fn parse_iso(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// First serial after Excel's nonexistent 1900-02-29 (serial 60).
const FIRST_SERIAL_AFTER_FAKE_LEAP_DAY: f64 = 61.0;

/// Convert a timestamp to an Excel serial number (1900 date system).
///
/// Excel counts 1900-02-29 as a real day, so every date before 1900-03-01
/// sits one serial lower than the plain day count.
pub fn excel_serial(dt: NaiveDateTime) -> f64 {
    let utc = dt.and_utc();
    let seconds = utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_nanos()) / 1e9;
    let serial = UNIX_EPOCH_SERIAL + seconds / SECONDS_PER_DAY;
    if serial < FIRST_SERIAL_AFTER_FAKE_LEAP_DAY {
        serial - 1.0
    } else {
        serial
    }
}

/// Presentation applied on top of the plain cell export.
#[derive(Debug, Clone, Default)]
pub struct SheetStyle {
    /// Column widths in character units, by column index.
    pub column_widths: Vec<f64>,
    /// Cells to fill, as (data row index, column index). Data row 0 is the
    /// first row after the header.
    pub filled_cells: HashSet<(usize, usize)>,
    /// Fill color as 0xRRGGBB.
    pub fill_rgb: u32,
}

/// Formats shared by every cell of one export.
struct CellFormats {
    plain: Format,
    date: Format,
    fill: Format,
    date_fill: Format,
}

impl CellFormats {
    fn new(fill_rgb: u32) -> Self {
        let fill = Format::new()
            .set_pattern(FormatPattern::Solid)
            .set_background_color(Color::RGB(fill_rgb));
        Self {
            plain: Format::new(),
            date: Format::new().set_num_format(DATETIME_FORMAT),
            date_fill: fill.clone().set_num_format(DATETIME_FORMAT),
            fill,
        }
    }
}

/// Export a record batch to a single-sheet XLSX file
pub fn export(batch: &RecordBatch, path: &Path) -> Result<(), String> {
    export_styled(batch, path, &SheetStyle::default())
}

/// Export a record batch with fills and column widths applied
pub fn export_styled(batch: &RecordBatch, path: &Path, style: &SheetStyle) -> Result<(), String> {
    let mut xlsx_workbook = XlsxWorkbook::new();
    let worksheet = xlsx_workbook.add_worksheet();
    let formats = CellFormats::new(style.fill_rgb);

    for (col, name) in batch.columns().iter().enumerate() {
        worksheet
            .write_string(0, col as u16, name)
            .map_err(|e| format!("Failed to write header '{}': {}", name, e))?;
    }

    for (row_idx, row) in batch.rows().iter().enumerate() {
        for (col, cell) in row.iter().enumerate() {
            let filled = style.filled_cells.contains(&(row_idx, col));
            write_cell(worksheet, (row_idx + 1) as u32, col as u16, cell, filled, &formats)?;
        }
    }

    for (col, width) in style.column_widths.iter().enumerate() {
        worksheet
            .set_column_width(col as u16, *width)
            .map_err(|e| format!("Failed to set width of column {}: {}", col, e))?;
    }

    xlsx_workbook
        .save(path)
        .map_err(|e| format!("Failed to save XLSX file: {}", e))?;

    Ok(())
}

fn write_cell(
    worksheet: &mut Worksheet,
    row: u32,
    col: u16,
    cell: &CellValue,
    filled: bool,
    formats: &CellFormats,
) -> Result<(), String> {
    let format = if filled { &formats.fill } else { &formats.plain };
    let written = match cell {
        CellValue::Empty => {
            if !filled {
                return Ok(());
            }
            worksheet.write_blank(row, col, format)
        }
        CellValue::Text(s) => worksheet.write_string_with_format(row, col, s, format),
        CellValue::Number(n) => worksheet.write_number_with_format(row, col, *n, format),
        CellValue::Bool(b) => worksheet.write_boolean_with_format(row, col, *b, format),
        CellValue::DateTime(dt) => {
            let format = if filled { &formats.date_fill } else { &formats.date };
            worksheet.write_number_with_format(row, col, excel_serial(*dt), format)
        }
    };
    written
        .map(|_| ())
        .map_err(|e| format!("Failed to write cell ({}, {}): {}", row, col, e))
}
