// CSV/TSV import

use std::io::Read;
use std::path::Path;

use intake_core::{CellValue, RecordBatch};

/// Field values read as missing, matching common spreadsheet/CSV tooling.
const NA_VALUES: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "#N/A", "<NA>",
];

/// Import a delimited text file. The first record is the header row.
pub fn import(path: &Path) -> Result<RecordBatch, String> {
    let content = read_file_as_utf8(path)?;
    let delimiter = sniff_delimiter(&content);
    import_from_string(&content, delimiter)
}

/// Detect the most likely field delimiter by checking consistency across the first few lines.
///
/// For each candidate (tab, semicolon, comma, pipe), count fields per line. The delimiter
/// that produces the most consistent field count (>1 field) wins.
fn sniff_delimiter(content: &str) -> u8 {
    let candidates: &[u8] = &[b'\t', b';', b',', b'|'];
    let sample_lines: Vec<&str> = content.lines().take(10).collect();

    if sample_lines.is_empty() {
        return b',';
    }

    let mut best = b',';
    let mut best_score = 0u64;

    for &delim in candidates {
        let counts: Vec<usize> = sample_lines
            .iter()
            .map(|line| {
                csv::ReaderBuilder::new()
                    .delimiter(delim)
                    .has_headers(false)
                    .flexible(true)
                    .from_reader(line.as_bytes())
                    .records()
                    .next()
                    .and_then(|r| r.ok())
                    .map(|r| r.len())
                    .unwrap_or(1)
            })
            .collect();

        // Must produce >1 field on the first line to be viable
        if counts.first().copied().unwrap_or(0) <= 1 {
            continue;
        }

        // Score: lines agreeing with line 1, weighted by field count
        let target = counts[0];
        let consistent = counts.iter().filter(|&&c| c == target).count() as u64;
        let score = consistent * target as u64;

        if score > best_score {
            best_score = score;
            best = delim;
        }
    }

    best
}

/// Read file and convert to UTF-8 if needed (handles Windows-1252, Latin-1, etc.)
pub fn read_file_as_utf8(path: &Path) -> Result<String, String> {
    let mut file = std::fs::File::open(path).map_err(|e| e.to_string())?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|e| e.to_string())?;

    // Strip a UTF-8 BOM so it doesn't end up glued to the first header
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        bytes.drain(..3);
    }

    match String::from_utf8(bytes) {
        Ok(s) => Ok(s),
        Err(e) => {
            let bytes = e.into_bytes();
            // Fall back to Windows-1252 (common for Excel-exported CSVs)
            let (decoded, _, _) = encoding_rs::WINDOWS_1252.decode(&bytes);
            Ok(decoded.into_owned())
        }
    }
}

fn import_from_string(content: &str, delimiter: u8) -> Result<RecordBatch, String> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_reader(content.as_bytes());

    let mut records = reader.records();
    let header = match records.next() {
        Some(result) => result.map_err(|e| e.to_string())?,
        None => return Err("file is empty (no header row)".to_string()),
    };
    let columns: Vec<String> = header.iter().map(|h| h.to_string()).collect();
    let width = columns.len();

    let mut raw: Vec<Vec<String>> = Vec::new();
    for result in records {
        let record = result.map_err(|e| e.to_string())?;
        // Blank lines carry no data
        if record.iter().all(|f| f.is_empty()) {
            continue;
        }
        let mut row: Vec<String> = record.iter().map(|f| f.to_string()).collect();
        if row.len() > width {
            return Err(format!(
                "row {} has {} fields, header has {}",
                raw.len() + 2,
                row.len(),
                width
            ));
        }
        row.resize(width, String::new());
        raw.push(row);
    }

    let kinds: Vec<ColumnKind> = (0..width)
        .map(|col| infer_column_kind(raw.iter().map(|r| r[col].as_str())))
        .collect();

    let mut batch = RecordBatch::new(columns);
    for row in raw {
        let cells = row
            .into_iter()
            .zip(&kinds)
            .map(|(field, kind)| convert_field(field, *kind))
            .collect();
        batch.push_row(cells);
    }

    Ok(batch)
}

/// Column type inferred from every non-missing field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnKind {
    Number,
    Bool,
    Text,
}

fn is_missing(field: &str) -> bool {
    field.is_empty() || NA_VALUES.contains(&field)
}

fn parse_number(field: &str) -> Option<f64> {
    let trimmed = field.trim();
    // Reject "inf"/"nan" spellings that f64::from_str would accept
    if !trimmed.bytes().any(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn parse_bool(field: &str) -> Option<bool> {
    match field {
        "True" | "TRUE" | "true" => Some(true),
        "False" | "FALSE" | "false" => Some(false),
        _ => None,
    }
}

fn infer_column_kind<'a>(fields: impl Iterator<Item = &'a str>) -> ColumnKind {
    let mut seen = false;
    let mut numeric = true;
    let mut boolean = true;

    for field in fields.filter(|f| !is_missing(f)) {
        seen = true;
        numeric &= parse_number(field).is_some();
        boolean &= parse_bool(field).is_some();
        if !numeric && !boolean {
            return ColumnKind::Text;
        }
    }

    match (seen, numeric, boolean) {
        (false, _, _) => ColumnKind::Text,
        (true, true, _) => ColumnKind::Number,
        (true, false, true) => ColumnKind::Bool,
        _ => ColumnKind::Text,
    }
}

fn convert_field(field: String, kind: ColumnKind) -> CellValue {
    if is_missing(&field) {
        return CellValue::Empty;
    }
    match kind {
        ColumnKind::Number => parse_number(&field)
            .map(CellValue::Number)
            .unwrap_or(CellValue::Text(field)),
        ColumnKind::Bool => parse_bool(&field)
            .map(CellValue::Bool)
            .unwrap_or(CellValue::Text(field)),
        ColumnKind::Text => CellValue::Text(field),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_sniff_semicolon_delimiter() {
        let content = "Name;Age;City\nAlice;30;Paris\nBob;25;London\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_sniff_comma_delimiter() {
        let content = "Name,Age,City\nAlice,30,Paris\nBob,25,London\n";
        assert_eq!(sniff_delimiter(content), b',');
    }

    #[test]
    fn test_sniff_tab_delimiter() {
        let content = "Name\tAge\tCity\nAlice\t30\tParis\nBob\t25\tLondon\n";
        assert_eq!(sniff_delimiter(content), b'\t');
    }

    #[test]
    fn test_sniff_semicolon_with_commas_in_values() {
        let content = "Name;Address;City\n\"Doe, Jane\";\"123 Main St, Apt 4\";Paris\nBob;\"456 Elm\";London\n";
        assert_eq!(sniff_delimiter(content), b';');
    }

    #[test]
    fn test_header_and_typed_columns() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("clients.csv");
        fs::write(
            &path,
            "Nome,CPF,Valor,Status\nana,123.456.789-09,1500.5,Ativo\nbia,987.654.321-00,,Cancelado\n",
        )
        .unwrap();

        let batch = import(&path).unwrap();
        assert_eq!(batch.columns(), &["Nome", "CPF", "Valor", "Status"]);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.get(0, "CPF"), Some(&CellValue::Text("123.456.789-09".into())));
        assert_eq!(batch.get(0, "Valor"), Some(&CellValue::Number(1500.5)));
        assert_eq!(batch.get(1, "Valor"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_digit_only_id_column_is_numeric() {
        // A file that was already normalized reads back with a numeric ID column
        let content = "Nome,CPF\nAna,12345678909\nBia,98765432100\n";
        let batch = import_from_string(content, b',').unwrap();
        assert_eq!(batch.get(0, "CPF"), Some(&CellValue::Number(12345678909.0)));
    }

    #[test]
    fn test_mixed_column_stays_text() {
        let content = "Valor\n100\nabc\n";
        let batch = import_from_string(content, b',').unwrap();
        assert_eq!(batch.get(0, "Valor"), Some(&CellValue::Text("100".into())));
    }

    #[test]
    fn test_na_markers_are_empty() {
        let content = "A,B\nNaN,x\nnull,y\n";
        let batch = import_from_string(content, b',').unwrap();
        assert_eq!(batch.get(0, "A"), Some(&CellValue::Empty));
        assert_eq!(batch.get(1, "A"), Some(&CellValue::Empty));
    }

    #[test]
    fn test_windows_1252_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("latin.csv");
        // "João" in Windows-1252
        fs::write(&path, b"Nome,X\nJo\xe3o,1\n").unwrap();
        let batch = import(&path).unwrap();
        assert_eq!(batch.get(0, "Nome"), Some(&CellValue::Text("João".into())));
    }

    #[test]
    fn test_empty_file_is_an_error() {
        assert!(import_from_string("", b',').is_err());
    }

    #[test]
    fn test_ragged_row_is_an_error() {
        assert!(import_from_string("A,B\n1,2,3\n", b',').is_err());
    }
}
