use crate::sheets::SheetsService;
use std::sync::Arc;

/// Ranges used when a request does not name one.
#[derive(Clone, Debug)]
pub struct DefaultRanges {
    pub read: String,
    pub write: String,
}

impl Default for DefaultRanges {
    fn default() -> Self {
        Self {
            read: "Sheet1!A:Z".to_string(),
            write: "Sheet1!A1".to_string(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpServerState {
    pub name: Arc<String>,
    pub sheets: Arc<SheetsService>,
    pub ranges: Arc<DefaultRanges>,
}
