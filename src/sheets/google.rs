use super::credentials::TokenProvider;
use super::{AuthKind, CellValue, Grid, SheetsError, SheetsSession, SpreadsheetInfo, cell_to_string};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

pub const DEFAULT_API_BASE_URL: &str = "https://sheets.googleapis.com/v4";

/// How the backend interprets written cells.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ValueInputOption {
    /// Stored exactly as sent.
    #[default]
    Raw,
    /// Parsed as if typed in the UI (formulas, dates, numbers).
    UserEntered,
}

impl ValueInputOption {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValueInputOption::Raw => "RAW",
            ValueInputOption::UserEntered => "USER_ENTERED",
        }
    }
}

impl FromStr for ValueInputOption {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "RAW" => Ok(ValueInputOption::Raw),
            "USER_ENTERED" => Ok(ValueInputOption::UserEntered),
            _ => anyhow::bail!("Invalid value input option: {} (expected RAW or USER_ENTERED)", s),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    pub base_url: String,
    pub value_input_option: ValueInputOption,
    pub request_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE_URL.to_string(),
            value_input_option: ValueInputOption::Raw,
            request_timeout: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<CellValue>>,
}

#[derive(Debug, Serialize)]
struct ValueRangeBody<'a> {
    values: &'a [Vec<CellValue>],
}

/// Session against the Google Sheets v4 REST API.
#[derive(Debug)]
pub struct GoogleSheetsSession {
    client: Client,
    base_url: String,
    value_input_option: ValueInputOption,
    tokens: Arc<dyn TokenProvider>,
    kind: AuthKind,
}

impl GoogleSheetsSession {
    pub fn new(
        tokens: Arc<dyn TokenProvider>,
        kind: AuthKind,
        options: &SessionOptions,
    ) -> Result<Self, SheetsError> {
        let client = Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(SheetsError::Transport)?;
        let base_url = options.base_url.trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(SheetsError::Configuration(
                "Sheets API base URL is empty".to_string(),
            ));
        }
        match url::Url::parse(&base_url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
            Ok(parsed) => {
                return Err(SheetsError::Configuration(format!(
                    "Unsupported Sheets API scheme: {}",
                    parsed.scheme()
                )));
            }
            Err(err) => {
                return Err(SheetsError::Configuration(format!(
                    "Invalid Sheets API base URL {}: {}",
                    base_url, err
                )));
            }
        }

        Ok(Self {
            client,
            base_url,
            value_input_option: options.value_input_option,
            tokens,
            kind,
        })
    }

    fn spreadsheet_url(&self, spreadsheet_id: &str) -> String {
        format!(
            "{}/spreadsheets/{}",
            self.base_url,
            urlencoding::encode(spreadsheet_id)
        )
    }

    fn values_url(&self, spreadsheet_id: &str, range: &str) -> String {
        format!(
            "{}/values/{}",
            self.spreadsheet_url(spreadsheet_id),
            urlencoding::encode(range)
        )
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, SheetsError> {
        let token = self.tokens.access_token().await?;
        let response = request.bearer_auth(token).send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SheetsError::from_api_body(status.as_u16(), &body))
    }
}

#[async_trait]
impl SheetsSession for GoogleSheetsSession {
    fn kind(&self) -> AuthKind {
        self.kind
    }

    async fn read_values(&self, spreadsheet_id: &str, range: &str) -> Result<Grid, SheetsError> {
        let url = self.values_url(spreadsheet_id, range);
        debug!("Sheets read: {}", url);
        let response = self.send(self.client.get(url)).await?;
        let body = response.bytes().await?;
        let value_range: ValueRange = serde_json::from_slice(&body)?;
        Ok(value_range
            .values
            .iter()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect())
    }

    async fn write_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<CellValue>],
    ) -> Result<(), SheetsError> {
        let url = self.values_url(spreadsheet_id, range);
        debug!("Sheets write: {} ({} rows)", url, values.len());
        let request = self
            .client
            .put(url)
            .query(&[("valueInputOption", self.value_input_option.as_str())])
            .json(&ValueRangeBody { values });
        self.send(request).await?;
        Ok(())
    }

    async fn append_values(
        &self,
        spreadsheet_id: &str,
        range: &str,
        values: &[Vec<CellValue>],
    ) -> Result<(), SheetsError> {
        let url = format!("{}:append", self.values_url(spreadsheet_id, range));
        debug!("Sheets append: {} ({} rows)", url, values.len());
        let request = self
            .client
            .post(url)
            .query(&[("valueInputOption", self.value_input_option.as_str())])
            .json(&ValueRangeBody { values });
        self.send(request).await?;
        Ok(())
    }

    async fn spreadsheet_info(&self, spreadsheet_id: &str) -> Result<SpreadsheetInfo, SheetsError> {
        let url = self.spreadsheet_url(spreadsheet_id);
        debug!("Sheets info: {}", url);
        let response = self.send(self.client.get(url)).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::credentials::StaticToken;
    use axum::extract::{Path, Query};
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use serde_json::{Value, json};
    use std::collections::HashMap;
    use std::sync::Mutex;

    type Captured = Arc<Mutex<Vec<(String, String, Value)>>>;

    fn authorized(headers: &HeaderMap) -> bool {
        headers
            .get("authorization")
            .and_then(|h| h.to_str().ok())
            .is_some_and(|h| h == "Bearer test-token")
    }

    /// Minimal stand-in for the Sheets API, listening on an ephemeral port.
    async fn fake_sheets_api() -> (String, Captured) {
        let captured: Captured = Arc::new(Mutex::new(Vec::new()));

        let read = |headers: HeaderMap, Path((id, range)): Path<(String, String)>| async move {
            if !authorized(&headers) {
                return (StatusCode::UNAUTHORIZED, Json(json!({"error": {"message": "bad token"}})));
            }
            match id.as_str() {
                "training" => (
                    StatusCode::OK,
                    Json(json!({
                        "range": range,
                        "values": [["ID", "Name", "CAT"], ["E1", "Alice", 3]]
                    })),
                ),
                "empty" => (StatusCode::OK, Json(json!({ "range": range }))),
                _ => (
                    StatusCode::NOT_FOUND,
                    Json(json!({"error": {"code": 404, "message": "Requested entity was not found."}})),
                ),
            }
        };

        let write_captured = captured.clone();
        let write = move |Path((id, range)): Path<(String, String)>,
                          Query(query): Query<HashMap<String, String>>,
                          Json(body): Json<Value>| {
            let captured = write_captured.clone();
            async move {
                let option = query.get("valueInputOption").cloned().unwrap_or_default();
                captured
                    .lock()
                    .unwrap()
                    .push((format!("PUT {}/{}", id, range), option, body));
                Json(json!({ "updatedRange": range }))
            }
        };

        let append_captured = captured.clone();
        let append = move |Path((id, range)): Path<(String, String)>,
                           Query(query): Query<HashMap<String, String>>,
                           Json(body): Json<Value>| {
            let captured = append_captured.clone();
            async move {
                let option = query.get("valueInputOption").cloned().unwrap_or_default();
                captured
                    .lock()
                    .unwrap()
                    .push((format!("POST {}/{}", id, range), option, body));
                Json(json!({ "updates": {} }))
            }
        };

        let info = |Path(id): Path<String>| async move {
            Json(json!({
                "spreadsheetId": id,
                "properties": {"title": "Training"},
                "sheets": [{"properties": {"title": "Sheet1"}}]
            }))
        };

        let app = Router::new()
            .route(
                "/v4/spreadsheets/{id}/values/{range}",
                get(read).put(write).post(append),
            )
            .route("/v4/spreadsheets/{id}", get(info));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{}/v4", address), captured)
    }

    fn session(base_url: &str, token: &str) -> GoogleSheetsSession {
        let options = SessionOptions {
            base_url: base_url.to_string(),
            ..SessionOptions::default()
        };
        GoogleSheetsSession::new(
            Arc::new(StaticToken::new(token)),
            AuthKind::ServiceAccount,
            &options,
        )
        .unwrap()
    }

    #[test]
    fn test_value_input_option_parsing() {
        assert_eq!("RAW".parse::<ValueInputOption>().unwrap(), ValueInputOption::Raw);
        assert_eq!(
            "user_entered".parse::<ValueInputOption>().unwrap(),
            ValueInputOption::UserEntered
        );
        assert!("FORMULA".parse::<ValueInputOption>().is_err());
    }

    #[test]
    fn test_urls_encode_ranges() {
        let session = session("https://sheets.googleapis.com/v4/", "t");
        assert_eq!(
            session.values_url("abc", "Sheet1!A:Z"),
            "https://sheets.googleapis.com/v4/spreadsheets/abc/values/Sheet1%21A%3AZ"
        );
        assert_eq!(
            session.spreadsheet_url("abc"),
            "https://sheets.googleapis.com/v4/spreadsheets/abc"
        );
    }

    #[test]
    fn test_empty_base_url_is_rejected() {
        let options = SessionOptions {
            base_url: "/".to_string(),
            ..SessionOptions::default()
        };
        let err = GoogleSheetsSession::new(
            Arc::new(StaticToken::new("t")),
            AuthKind::Oauth,
            &options,
        )
        .unwrap_err();
        assert!(matches!(err, SheetsError::Configuration(_)));

        for base_url in ["sheets.googleapis.com/v4", "ftp://sheets.example.com"] {
            let options = SessionOptions {
                base_url: base_url.to_string(),
                ..SessionOptions::default()
            };
            let result = GoogleSheetsSession::new(
                Arc::new(StaticToken::new("t")),
                AuthKind::Oauth,
                &options,
            );
            assert!(matches!(result, Err(SheetsError::Configuration(_))), "{}", base_url);
        }
    }

    #[tokio::test]
    async fn test_read_values() {
        let (base_url, _) = fake_sheets_api().await;
        let session = session(&base_url, "test-token");

        let grid = session.read_values("training", "Sheet1!A:Z").await.unwrap();
        assert_eq!(grid, vec![vec!["ID", "Name", "CAT"], vec!["E1", "Alice", "3"]]);

        let grid = session.read_values("empty", "Sheet1!A:Z").await.unwrap();
        assert!(grid.is_empty());
    }

    #[tokio::test]
    async fn test_api_errors_are_reported() {
        let (base_url, _) = fake_sheets_api().await;

        let err = session(&base_url, "test-token")
            .read_values("missing", "Sheet1!A:Z")
            .await
            .unwrap_err();
        match err {
            SheetsError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "Requested entity was not found.");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = session(&base_url, "wrong-token")
            .read_values("training", "Sheet1!A:Z")
            .await
            .unwrap_err();
        assert!(matches!(err, SheetsError::Api { status: 401, .. }));
    }

    #[tokio::test]
    async fn test_write_and_append_bodies() {
        let (base_url, captured) = fake_sheets_api().await;
        let session = session(&base_url, "test-token");
        let values = vec![vec![json!("E9"), json!("Zoe"), json!(12)]];

        session
            .write_values("training", "Sheet1!A1", &values)
            .await
            .unwrap();
        session
            .append_values("training", "Sheet1!A:Z", &values)
            .await
            .unwrap();

        let captured = captured.lock().unwrap();
        assert_eq!(captured.len(), 2);
        assert_eq!(captured[0].0, "PUT training/Sheet1!A1");
        assert_eq!(captured[0].1, "RAW");
        assert_eq!(captured[0].2, json!({"values": [["E9", "Zoe", 12]]}));
        assert_eq!(captured[1].0, "POST training/Sheet1!A:Z:append");
        assert_eq!(captured[1].1, "RAW");
    }

    #[tokio::test]
    async fn test_spreadsheet_info() {
        let (base_url, _) = fake_sheets_api().await;
        let info = session(&base_url, "test-token")
            .spreadsheet_info("training")
            .await
            .unwrap();
        assert_eq!(info["spreadsheetId"], "training");
        assert_eq!(info["properties"]["title"], "Training");
    }

    #[tokio::test]
    async fn test_transport_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let err = session(&format!("http://{}/v4", address), "test-token")
            .read_values("training", "Sheet1!A:Z")
            .await
            .unwrap_err();
        assert!(matches!(err, SheetsError::Transport(_)));
    }
}
