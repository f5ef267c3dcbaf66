use crate::cell::CellValue;

/// An ordered table: column names plus rows of cells aligned to them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordBatch {
    columns: Vec<String>,
    rows: Vec<Vec<CellValue>>,
}

impl RecordBatch {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_rows(columns: Vec<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let mut batch = Self::new(columns);
        for row in rows {
            batch.push_row(row);
        }
        batch
    }

    /// Append a row, padding with `Empty` (or truncating) to the header width.
    pub fn push_row(&mut self, mut row: Vec<CellValue>) {
        row.resize(self.columns.len(), CellValue::Empty);
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn rows_mut(&mut self) -> &mut [Vec<CellValue>] {
        &mut self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Index of the first column whose header matches `name` exactly.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell at (row, column name), if both exist.
    pub fn get(&self, row: usize, column: &str) -> Option<&CellValue> {
        let col = self.column_index(column)?;
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Iterate over the cells of one column.
    pub fn column_values(&self, col: usize) -> impl Iterator<Item = &CellValue> {
        self.rows.iter().filter_map(move |r| r.get(col))
    }

    /// Keep only the rows matching `keep`, preserving order.
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[CellValue]) -> bool,
    {
        self.rows.retain(|r| keep(r));
    }

    /// A new batch with the same columns holding only the rows matching `keep`.
    pub fn filtered<F>(&self, mut keep: F) -> RecordBatch
    where
        F: FnMut(&[CellValue]) -> bool,
    {
        RecordBatch {
            columns: self.columns.clone(),
            rows: self.rows.iter().filter(|r| keep(r)).cloned().collect(),
        }
    }
}
