use crate::sheets::{
    AuthKind, CellValue, Grid, SheetsError, SheetsSession, SpreadsheetInfo, values_to_grid,
};
use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

/// A call received by [`InMemorySession`].
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub operation: &'static str,
    pub spreadsheet_id: String,
    pub range: String,
}

/// Spreadsheet session kept in memory. Ranges are recorded but not
/// interpreted: every read returns the whole sheet.
#[derive(Debug, Default)]
pub struct InMemorySession {
    sheets: Mutex<HashMap<String, Vec<Vec<CellValue>>>>,
    calls: Mutex<Vec<RecordedCall>>,
    failing: bool,
    kind: Option<AuthKind>,
    delay: Option<Duration>,
}

impl InMemorySession {
    pub fn new() -> Self {
        Self::default()
    }

    /// A session whose every call fails as if the network were down.
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    pub fn with_sheet(self, spreadsheet_id: &str, values: Vec<Vec<CellValue>>) -> Self {
        self.sheets
            .lock()
            .unwrap()
            .insert(spreadsheet_id.to_string(), values);
        self
    }

    pub fn with_kind(mut self, kind: AuthKind) -> Self {
        self.kind = Some(kind);
        self
    }

    /// Wait `delay` before answering each call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn grid(&self, spreadsheet_id: &str) -> Option<Grid> {
        self.sheets
            .lock()
            .unwrap()
            .get(spreadsheet_id)
            .map(|values| values_to_grid(values))
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }

    fn record(&self, operation: &'static str, spreadsheet_id: &str, range: &str) -> Result<(), SheetsError> {
        self.calls.lock().unwrap().push(RecordedCall {
            operation,
            spreadsheet_id: spreadsheet_id.to_string(),
            range: range.to_string(),
        });
        if self.failing {
            return Err(SheetsError::Io(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "simulated transport failure",
            )));
        }
        Ok(())
    }

    fn not_found(spreadsheet_id: &str) -> SheetsError {
        SheetsError::Api {
            status: 404,
            message: format!("Spreadsheet {} not found", spreadsheet_id),
        }
    }
}

#[async_trait]
impl SheetsSession for InMemorySession {
    fn kind(&self) -> AuthKind {
        self.kind.unwrap_or(AuthKind::ServiceAccount)
    }

    async fn read_values(&self, spreadsheet_id: &str, range: &str) -> Result<Grid, SheetsError> {
        self.pause().await;
        self.record("read", spreadsheet_id, range)?;
        self.grid(spreadsheet_id)
            .ok_or_else(|| Self::not_found(spreadsheet_id))
    }

    async fn write_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<CellValue>],
    ) -> Result<(), SheetsError> {
        self.pause().await;
        self.record("write", spreadsheet_id, range)?;
        let mut sheets = self.sheets.lock().unwrap();
        let sheet = sheets
            .get_mut(spreadsheet_id)
            .ok_or_else(|| Self::not_found(spreadsheet_id))?;
        *sheet = values.to_vec();
        Ok(())
    }

    async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<CellValue>],
    ) -> Result<(), SheetsError> {
        self.pause().await;
        self.record("append", spreadsheet_id, range)?;
        let mut sheets = self.sheets.lock().unwrap();
        let sheet = sheets
            .get_mut(spreadsheet_id)
            .ok_or_else(|| Self::not_found(spreadsheet_id))?;
        sheet.extend(values.iter().cloned());
        Ok(())
    }

    async fn spreadsheet_info(&self, spreadsheet_id: &str) -> Result<SpreadsheetInfo, SheetsError> {
        self.pause().await;
        self.record("info", spreadsheet_id, "")?;
        let sheets = self.sheets.lock().unwrap();
        let values = sheets
            .get(spreadsheet_id)
            .ok_or_else(|| Self::not_found(spreadsheet_id))?;
        let mut info = SpreadsheetInfo::new();
        info.insert("spreadsheetId".to_string(), json!(spreadsheet_id));
        info.insert("properties".to_string(), json!({ "title": spreadsheet_id }));
        info.insert(
            "sheets".to_string(),
            json!([{
                "properties": {
                    "title": "Sheet1",
                    "gridProperties": { "rowCount": values.len() }
                }
            }]),
        );
        Ok(info)
    }
}
