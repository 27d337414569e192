use super::credentials::token_provider;
use super::google::{GoogleSheetsSession, SessionOptions};
use super::{AuthKind, CellValue, Credentials, Grid, SheetsError, SheetsSession, SpreadsheetInfo};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Process-wide adapter over the spreadsheet backend.
///
/// Holds at most one authenticated session. Each operation comes in two
/// flavours: `try_*` returns the backend error, while the plain variant
/// collapses failures into an empty grid, an empty map or `false`. A failed
/// read therefore looks exactly like an empty sheet to its callers; the
/// failure is only visible in the logs.
#[derive(Debug)]
pub struct SheetsService {
    session: RwLock<Option<Arc<dyn SheetsSession>>>,
    options: SessionOptions,
}

impl Default for SheetsService {
    fn default() -> Self {
        Self::new(SessionOptions::default())
    }
}

impl SheetsService {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            session: RwLock::new(None),
            options,
        }
    }

    /// Authenticate and replace the current session.
    ///
    /// A first access token is requested straight away, so bad keys,
    /// cancelled consent screens and unreachable token endpoints are all
    /// reported here rather than on the first read.
    pub async fn authenticate(&self, credentials: Credentials) -> bool {
        let kind = credentials.kind();
        match self.connect(credentials).await {
            Ok(session) => {
                self.install_session(session).await;
                info!("Authenticated with {}", kind.as_str());
                true
            }
            Err(err) => {
                warn!("Authentication with {} failed: {}", kind.as_str(), err);
                false
            }
        }
    }

    async fn connect(&self, credentials: Credentials) -> Result<Arc<dyn SheetsSession>, SheetsError> {
        let kind = credentials.kind();
        let tokens = token_provider(credentials).await?;
        tokens.access_token().await?;
        Ok(Arc::new(GoogleSheetsSession::new(tokens, kind, &self.options)?))
    }

    pub async fn install_session(&self, session: Arc<dyn SheetsSession>) {
        *self.session.write().await = Some(session);
    }

    pub async fn is_authenticated(&self) -> bool {
        self.session.read().await.is_some()
    }

    pub async fn auth_kind(&self) -> Option<AuthKind> {
        self.session.read().await.as_ref().map(|s| s.kind())
    }

    // The session is cloned out so the lock is not held during remote calls.
    async fn session(&self) -> Result<Arc<dyn SheetsSession>, SheetsError> {
        self.session
            .read()
            .await
            .clone()
            .ok_or(SheetsError::NotAuthenticated)
    }

    pub async fn try_read_range(&self, spreadsheet_id: &str, range: &str) -> Result<Grid, SheetsError> {
        self.session().await?.read_values(spreadsheet_id, range).await
    }

    pub async fn try_write_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<CellValue>],
    ) -> Result<(), SheetsError> {
        self.session()
            .await?
            .write_values(spreadsheet_id, range, values)
            .await
    }

    pub async fn try_append_range(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<CellValue>],
    ) -> Result<(), SheetsError> {
        self.session()
            .await?
            .append_values(spreadsheet_id, range, values)
            .await
    }

    pub async fn try_get_info(&self, spreadsheet_id: &str) -> Result<SpreadsheetInfo, SheetsError> {
        self.session().await?.spreadsheet_info(spreadsheet_id).await
    }

    pub async fn read_range(&self, spreadsheet_id: &str, range: &str) -> Grid {
        self.try_read_range(spreadsheet_id, range)
            .await
            .unwrap_or_else(|err| {
                warn!(spreadsheet_id, range, "Read failed: {}", err);
                Grid::new()
            })
    }

    pub async fn write_range(&self, spreadsheet_id: &str, range: &str, values: &[Vec<CellValue>]) -> bool {
        match self.try_write_range(spreadsheet_id, range, values).await {
            Ok(()) => true,
            Err(err) => {
                warn!(spreadsheet_id, range, "Write failed: {}", err);
                false
            }
        }
    }

    pub async fn append_range(&self, spreadsheet_id: &str, range: &str, values: &[Vec<CellValue>]) -> bool {
        match self.try_append_range(spreadsheet_id, range, values).await {
            Ok(()) => true,
            Err(err) => {
                warn!(spreadsheet_id, range, "Append failed: {}", err);
                false
            }
        }
    }

    pub async fn get_info(&self, spreadsheet_id: &str) -> SpreadsheetInfo {
        self.try_get_info(spreadsheet_id).await.unwrap_or_else(|err| {
            warn!(spreadsheet_id, "Info failed: {}", err);
            SpreadsheetInfo::new()
        })
    }
}
