use thiserror::Error;

/// Errors raised while talking to the spreadsheet backend.
#[derive(Error, Debug)]
pub enum SheetsError {
    #[error("Service not authenticated")]
    NotAuthenticated,

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Token acquisition failed: {0}")]
    Token(#[from] yup_oauth2::Error),

    #[error("Access token missing from token response")]
    MissingAccessToken,

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("Sheets API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response from Sheets API: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SheetsError {
    pub fn invalid_credentials(err: impl std::fmt::Display) -> Self {
        SheetsError::InvalidCredentials(err.to_string())
    }

    /// Build an API error from a response body, preferring the
    /// `error.message` field Google puts in its error payloads.
    pub fn from_api_body(status: u16, body: &str) -> Self {
        let message = serde_json::from_str::<serde_json::Value>(body)
            .ok()
            .and_then(|value| {
                value
                    .pointer("/error/message")
                    .and_then(|m| m.as_str())
                    .map(str::to_owned)
            })
            .unwrap_or_else(|| body.trim().to_string());
        SheetsError::Api { status, message }
    }
}
