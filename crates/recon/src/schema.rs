use intake_core::{RecordBatch, REQUIRED_COLUMNS};

/// True iff every required column is present. Extra columns are fine.
pub fn has_required_columns(batch: &RecordBatch) -> bool {
    REQUIRED_COLUMNS.iter().all(|c| batch.has_column(c))
}

/// Required columns absent from the batch, in contract order.
pub fn missing_columns(batch: &RecordBatch) -> Vec<&'static str> {
    REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|c| !batch.has_column(c))
        .collect()
}
