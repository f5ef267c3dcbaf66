use std::collections::BTreeMap;

use intake_core::{
    CellValue, RecordBatch, COL_CONTRACT_TYPE, COL_VALUE, SUMMARY_CLIENT_COUNT,
    SUMMARY_TOTAL_VALUE,
};
use serde::Serialize;

/// Count and value total for one contract type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContractTotal {
    pub contract_type: String,
    pub client_count: usize,
    pub total_value: f64,
}

/// Per-contract-type totals, ordered by contract type.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ContractSummary {
    pub rows: Vec<ContractTotal>,
}

impl ContractSummary {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Tabular form written to the summary report.
    pub fn to_batch(&self) -> RecordBatch {
        RecordBatch::with_rows(
            vec![
                COL_CONTRACT_TYPE.to_string(),
                SUMMARY_CLIENT_COUNT.to_string(),
                SUMMARY_TOTAL_VALUE.to_string(),
            ],
            self.rows
                .iter()
                .map(|t| {
                    vec![
                        CellValue::Text(t.contract_type.clone()),
                        CellValue::Number(t.client_count as f64),
                        CellValue::Number(t.total_value),
                    ]
                })
                .collect(),
        )
    }
}

/// Group rows by contract type, counting rows and summing values.
/// Rows without a contract type belong to no group.
pub fn summarize(active: &RecordBatch) -> ContractSummary {
    let (Some(type_col), value_col) = (
        active.column_index(COL_CONTRACT_TYPE),
        active.column_index(COL_VALUE),
    ) else {
        return ContractSummary::default();
    };

    let mut groups: BTreeMap<String, (usize, f64)> = BTreeMap::new();

    for row in active.rows() {
        let key = &row[type_col];
        if key.is_empty() {
            continue;
        }
        let entry = groups.entry(key.display()).or_insert((0, 0.0));
        entry.0 += 1;
        if let Some(v) = value_col.and_then(|c| row[c].as_number()) {
            entry.1 += v;
        }
    }

    ContractSummary {
        rows: groups
            .into_iter()
            .map(|(contract_type, (client_count, total_value))| ContractTotal {
                contract_type,
                client_count,
                total_value,
            })
            .collect(),
    }
}
