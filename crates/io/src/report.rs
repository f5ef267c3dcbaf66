// Report writing: organized output + contract summary, then an ID-highlight
// and column-fit pass over the organized output.
//
// The organized file is written plain first and stays valid on its own. The
// highlight/fit pass re-reads it, restyles it into a sibling temp file and
// renames that over the original, so the file is never left half-written.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use intake_core::{digits_only, RecordBatch, COL_NATIONAL_ID, NATIONAL_ID_DIGITS};
use serde::Serialize;

use crate::xlsx::{self, SheetStyle};

/// Fill applied to malformed national-ID cells (light red).
pub const HIGHLIGHT_RGB: u32 = 0xFFC7CE;

/// Extra character units added to the longest cell of each column.
pub const COLUMN_PADDING: usize = 2;

/// What the report writer produced for one raw file.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportOutcome {
    pub organized_path: PathBuf,
    pub summary_path: PathBuf,
    pub active_rows: usize,
    pub summary_rows: usize,
    /// Number of ID cells that were highlighted.
    pub highlighted: usize,
    /// False when the organized output had no ID header to check.
    pub id_column_found: bool,
    pub column_widths: Vec<f64>,
}

/// Result of the highlight/fit pass over one organized file.
#[derive(Debug, Clone, PartialEq)]
pub struct RestyleOutcome {
    pub highlighted: usize,
    pub id_column_found: bool,
    pub column_widths: Vec<f64>,
}

/// Write the organized output and the summary, then highlight and fit.
pub fn write_reports(
    active: &RecordBatch,
    summary: &RecordBatch,
    organized_path: &Path,
    summary_path: &Path,
) -> Result<ReportOutcome, String> {
    xlsx::export(active, organized_path)
        .map_err(|e| format!("{}: {}", organized_path.display(), e))?;
    xlsx::export(summary, summary_path)
        .map_err(|e| format!("{}: {}", summary_path.display(), e))?;

    let restyled = highlight_and_fit(organized_path)?;

    Ok(ReportOutcome {
        organized_path: organized_path.to_path_buf(),
        summary_path: summary_path.to_path_buf(),
        active_rows: active.len(),
        summary_rows: summary.len(),
        highlighted: restyled.highlighted,
        id_column_found: restyled.id_column_found,
        column_widths: restyled.column_widths,
    })
}

/// Re-open a written report, fill malformed ID cells and size every column.
pub fn highlight_and_fit(path: &Path) -> Result<RestyleOutcome, String> {
    let batch = xlsx::import(path).map_err(|e| format!("{}: {}", path.display(), e))?;

    let id_col = batch.column_index(COL_NATIONAL_ID);
    let filled_cells = match id_col {
        Some(col) => malformed_id_cells(&batch, col),
        None => HashSet::new(),
    };
    let column_widths = fit_column_widths(&batch);

    let style = SheetStyle {
        column_widths: column_widths.clone(),
        filled_cells,
        fill_rgb: HIGHLIGHT_RGB,
    };

    let tmp = temp_sibling(path);
    xlsx::export_styled(&batch, &tmp, &style)
        .map_err(|e| format!("{}: {}", tmp.display(), e))?;
    fs::rename(&tmp, path).map_err(|e| {
        let _ = fs::remove_file(&tmp);
        format!("cannot replace {}: {}", path.display(), e)
    })?;

    Ok(RestyleOutcome {
        highlighted: style.filled_cells.len(),
        id_column_found: id_col.is_some(),
        column_widths,
    })
}

/// True when the displayed ID does not have exactly 11 digits.
pub fn is_malformed_id(displayed: &str) -> bool {
    digits_only(displayed).len() != NATIONAL_ID_DIGITS
}

fn malformed_id_cells(batch: &RecordBatch, col: usize) -> HashSet<(usize, usize)> {
    batch
        .column_values(col)
        .enumerate()
        .filter(|(_, cell)| is_malformed_id(&cell.display()))
        .map(|(row, _)| (row, col))
        .collect()
}

/// Width per column: longest non-empty displayed cell (header included) + padding.
pub fn fit_column_widths(batch: &RecordBatch) -> Vec<f64> {
    batch
        .columns()
        .iter()
        .enumerate()
        .map(|(col, header)| {
            let longest_cell = batch
                .column_values(col)
                .map(|cell| cell.display())
                .filter(|s| !s.is_empty())
                .map(|s| s.chars().count())
                .max()
                .unwrap_or(0);
            let longest = longest_cell.max(header.chars().count());
            (longest + COLUMN_PADDING) as f64
        })
        .collect()
}

fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.tmp"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use intake_core::CellValue;
    use std::io::Read;
    use tempfile::tempdir;

    fn id_batch(ids: &[&str]) -> RecordBatch {
        RecordBatch::with_rows(
            vec!["Nome".into(), "CPF".into()],
            ids.iter()
                .map(|id| vec![CellValue::text("Ana"), CellValue::text(*id)])
                .collect(),
        )
    }

    fn zip_entry(path: &Path, name: &str) -> String {
        let file = fs::File::open(path).unwrap();
        let mut archive = zip::ZipArchive::new(file).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut xml = String::new();
        entry.read_to_string(&mut xml).unwrap();
        xml
    }

    #[test]
    fn test_malformed_id_rule() {
        assert!(!is_malformed_id("12345678909"));
        assert!(!is_malformed_id("123.456.789-09"));
        assert!(is_malformed_id("123456"));
        assert!(is_malformed_id(""));
        assert!(is_malformed_id("123456789012"));
    }

    #[test]
    fn test_three_of_ten_highlighted() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clients.xlsx");
        let ids = [
            "12345678909", "123456", "98765432100", "11122233344", "1",
            "55566677788", "12312312312", "999", "10101010101", "20202020202",
        ];
        xlsx::export(&id_batch(&ids), &path).unwrap();

        let outcome = highlight_and_fit(&path).unwrap();
        assert!(outcome.id_column_found);
        assert_eq!(outcome.highlighted, 3);

        let styles = zip_entry(&path, "xl/styles.xml");
        assert!(styles.contains("FFC7CE"), "highlight fill missing from styles");
    }

    #[test]
    fn test_missing_id_column_is_zero_highlights() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("no_id.xlsx");
        let batch = RecordBatch::with_rows(
            vec!["Nome".into()],
            vec![vec![CellValue::text("Ana")]],
        );
        xlsx::export(&batch, &path).unwrap();

        let outcome = highlight_and_fit(&path).unwrap();
        assert!(!outcome.id_column_found);
        assert_eq!(outcome.highlighted, 0);
    }

    #[test]
    fn test_width_is_longest_plus_two() {
        let batch = RecordBatch::with_rows(
            vec!["Cod".into(), "Vazio".into()],
            vec![
                vec![CellValue::text("ABCDEFGH"), CellValue::Empty],
                vec![CellValue::text("AB"), CellValue::Empty],
            ],
        );
        let widths = fit_column_widths(&batch);
        assert_eq!(widths, vec![10.0, 7.0]);
    }

    #[test]
    fn test_fitted_widths_reach_the_sheet() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("widths.xlsx");
        let batch = RecordBatch::with_rows(
            vec!["Cod".into(), "Vazio".into()],
            vec![
                vec![CellValue::text("ABCDEFGH"), CellValue::Empty],
                vec![CellValue::text("AB"), CellValue::Empty],
            ],
        );
        xlsx::export(&batch, &path).unwrap();

        let outcome = highlight_and_fit(&path).unwrap();
        assert_eq!(outcome.column_widths, vec![10.0, 7.0]);

        // Excel stores character widths with the font's cell padding added
        let sheet = zip_entry(&path, "xl/worksheets/sheet1.xml");
        assert!(sheet.contains(r#"width="10.7109375""#), "sheet cols: {sheet}");
        assert!(sheet.contains(r#"width="7.7109375""#), "sheet cols: {sheet}");
    }

    #[test]
    fn test_width_counts_characters_not_bytes() {
        let batch = RecordBatch::with_rows(
            vec!["N".into()],
            vec![vec![CellValue::text("João")]],
        );
        assert_eq!(fit_column_widths(&batch), vec![6.0]);
    }

    #[test]
    fn test_write_reports_writes_both_files() {
        let dir = tempdir().unwrap();
        let organized = dir.path().join("organized.xlsx");
        let summary_path = dir.path().join("summary.xlsx");

        let active = id_batch(&["12345678909", "123"]);
        let summary = RecordBatch::with_rows(
            vec!["Tipo de Contrato".into(), "Qtd Clientes".into(), "Valor Total (R$)".into()],
            vec![vec![CellValue::text("A"), CellValue::Number(2.0), CellValue::Number(300.0)]],
        );

        let outcome = write_reports(&active, &summary, &organized, &summary_path).unwrap();
        assert_eq!(outcome.active_rows, 2);
        assert_eq!(outcome.summary_rows, 1);
        assert_eq!(outcome.highlighted, 1);
        assert!(organized.exists());
        assert!(summary_path.exists());
        assert!(!dir.path().join(".organized.xlsx.tmp").exists());

        let back = xlsx::import(&summary_path).unwrap();
        assert_eq!(back.get(0, "Qtd Clientes"), Some(&CellValue::Number(2.0)));
    }
}
