// JSON import
//
// Accepts the two layouts record-oriented tools usually emit:
//   records: [{"Nome": "...", "CPF": "..."}, ...]
//   columns: {"Nome": ["...", ...]} or {"Nome": {"0": "...", ...}}

use std::fs;
use std::path::Path;

use intake_core::{CellValue, RecordBatch};
use serde_json::{Map, Value};

pub fn import(path: &Path) -> Result<RecordBatch, String> {
    let content = fs::read_to_string(path).map_err(|e| e.to_string())?;
    import_from_str(&content)
}

pub fn import_from_str(content: &str) -> Result<RecordBatch, String> {
    let value: Value = serde_json::from_str(content).map_err(|e| format!("invalid JSON: {e}"))?;

    match value {
        Value::Array(records) => from_records(records),
        Value::Object(columns) => from_columns(columns),
        _ => Err("expected a JSON array of records or an object of columns".to_string()),
    }
}

fn from_records(records: Vec<Value>) -> Result<RecordBatch, String> {
    // Column order = first-seen key order across all records
    let mut columns: Vec<String> = Vec::new();
    let mut objects: Vec<Map<String, Value>> = Vec::with_capacity(records.len());

    for (idx, record) in records.into_iter().enumerate() {
        let Value::Object(obj) = record else {
            return Err(format!("record {idx} is not a JSON object"));
        };
        for key in obj.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
        objects.push(obj);
    }

    let mut batch = RecordBatch::new(columns.clone());
    for mut obj in objects {
        let row = columns
            .iter()
            .map(|c| obj.remove(c).map(to_cell).unwrap_or(CellValue::Empty))
            .collect();
        batch.push_row(row);
    }
    Ok(batch)
}

fn from_columns(columns: Map<String, Value>) -> Result<RecordBatch, String> {
    let names: Vec<String> = columns.keys().cloned().collect();
    let mut data: Vec<Vec<CellValue>> = Vec::with_capacity(names.len());

    for (name, column) in columns {
        let cells = match column {
            Value::Array(values) => values.into_iter().map(to_cell).collect(),
            Value::Object(by_index) => {
                let mut entries: Vec<(String, Value)> = by_index.into_iter().collect();
                // Index keys are usually "0", "1", ...; order numerically when they are
                entries.sort_by(|(a, _), (b, _)| match (a.parse::<u64>(), b.parse::<u64>()) {
                    (Ok(x), Ok(y)) => x.cmp(&y),
                    _ => a.cmp(b),
                });
                entries.into_iter().map(|(_, v)| to_cell(v)).collect()
            }
            _ => return Err(format!("column {name:?} is neither an array nor an object")),
        };
        data.push(cells);
    }

    let height = data.iter().map(Vec::len).max().unwrap_or(0);
    let mut batch = RecordBatch::new(names);
    for row in 0..height {
        batch.push_row(
            data.iter()
                .map(|col| col.get(row).cloned().unwrap_or(CellValue::Empty))
                .collect(),
        );
    }
    Ok(batch)
}

fn to_cell(value: Value) -> CellValue {
    match value {
        Value::Null => CellValue::Empty,
        Value::Bool(b) => CellValue::Bool(b),
        Value::Number(n) => n.as_f64().map(CellValue::Number).unwrap_or(CellValue::Empty),
        Value::String(s) => CellValue::text(s),
        nested => CellValue::Text(nested.to_string()),
    }
}
