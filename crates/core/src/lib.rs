// Core types shared by the loader, the pipeline and the report writer

pub mod batch;
pub mod cell;

pub use batch::RecordBatch;
pub use cell::CellValue;

/// Client name column.
pub const COL_NAME: &str = "Nome";
/// National ID (CPF) column.
pub const COL_NATIONAL_ID: &str = "CPF";
/// Contract date column.
pub const COL_DATE: &str = "Data";
/// Contract value column.
pub const COL_VALUE: &str = "Valor";
/// Client status column.
pub const COL_STATUS: &str = "Status";
/// Contract type column.
pub const COL_CONTRACT_TYPE: &str = "Tipo de Contrato";

/// Columns every raw file must carry (exact, case-sensitive).
pub const REQUIRED_COLUMNS: [&str; 6] = [
    COL_NAME,
    COL_NATIONAL_ID,
    COL_DATE,
    COL_VALUE,
    COL_STATUS,
    COL_CONTRACT_TYPE,
];

/// Summary report headers.
pub const SUMMARY_CLIENT_COUNT: &str = "Qtd Clientes";
pub const SUMMARY_TOTAL_VALUE: &str = "Valor Total (R$)";

/// A well-formed CPF has exactly this many digits.
pub const NATIONAL_ID_DIGITS: usize = 11;

/// Keep only the ASCII digits of `s`, in order.
pub fn digits_only(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).collect()
}
