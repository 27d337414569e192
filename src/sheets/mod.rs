use async_trait::async_trait;
use serde_json::{Map, Value};
use std::fmt::Debug;

pub mod credentials;
pub mod error;
pub mod google;
pub mod service;

pub use credentials::{AuthKind, Credentials};
pub use error::SheetsError;
pub use service::SheetsService;

/// OAuth scope granting read and write access to spreadsheets.
pub const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Rows of cells as returned by a read, row 0 first.
pub type Grid = Vec<Vec<String>>;

/// A cell sent on write or append. Strings, numbers, booleans and null are
/// forwarded to the backend unchanged.
pub type CellValue = Value;

/// Spreadsheet metadata object (title, locale, sheets, ...).
pub type SpreadsheetInfo = Map<String, Value>;

/// One authenticated connection to a spreadsheet backend.
#[async_trait]
pub trait SheetsSession: Send + Sync + Debug {
    fn kind(&self) -> AuthKind;

    async fn read_values(&self, spreadsheet_id: &str, range: &str) -> Result<Grid, SheetsError>;

    /// Overwrite `range` with `values`.
    async fn write_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<CellValue>],
    ) -> Result<(), SheetsError>;

    /// Append `values` after the last row of data found in `range`.
    async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<CellValue>],
    ) -> Result<(), SheetsError>;

    async fn spreadsheet_info(&self, spreadsheet_id: &str) -> Result<SpreadsheetInfo, SheetsError>;
}

/// Render a cell the way a formatted read would show it.
pub fn cell_to_string(cell: &CellValue) -> String {
    match cell {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(true) => "TRUE".to_string(),
        Value::Bool(false) => "FALSE".to_string(),
        other => other.to_string(),
    }
}

pub fn values_to_grid(values: &[Vec<CellValue>]) -> Grid {
    values
        .iter()
        .map(|row| row.iter().map(cell_to_string).collect())
        .collect()
}
