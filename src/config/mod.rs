use crate::sheets::google::{SessionOptions, ValueInputOption};
use anyhow::Error;
use confique::Config;
use std::{
    net::IpAddr,
    sync::{Arc, OnceLock},
    time::Duration,
};

#[derive(Debug, Config)]
pub struct TrainingSheetsConfig {
    #[config(env = "TRAINING_SHEETS_PORT", default = 5000)]
    pub port: u16,
    #[config(env = "TRAINING_SHEETS_ENDPOINT", default = "127.0.0.1")]
    pub endpoint: IpAddr,

    #[config(env = "TRAINING_SHEETS_HTTP_BODY_LIMIT", default = "10mb")]
    pub http_body_limit: String,

    /// Allow any origin, the scheduling frontend is served separately.
    #[config(env = "TRAINING_SHEETS_CORS_PERMISSIVE", default = true)]
    pub cors_permissive: bool,

    #[config(
        env = "TRAINING_SHEETS_API_BASE_URL",
        default = "https://sheets.googleapis.com/v4"
    )]
    pub sheets_api_base_url: String,

    #[config(env = "TRAINING_SHEETS_DEFAULT_READ_RANGE", default = "Sheet1!A:Z")]
    pub default_read_range: String,

    #[config(env = "TRAINING_SHEETS_DEFAULT_WRITE_RANGE", default = "Sheet1!A1")]
    pub default_write_range: String,

    #[config(env = "TRAINING_SHEETS_VALUE_INPUT_OPTION", default = "RAW")]
    pub value_input_option: String,

    #[config(env = "TRAINING_SHEETS_REQUEST_TIMEOUT_SECONDS", default = 30)]
    pub request_timeout_seconds: u64,

    /// Service account key used to authenticate at startup.
    #[config(env = "TRAINING_SHEETS_SERVICE_ACCOUNT_FILE")]
    pub service_account_file: Option<String>,

    #[config(env = "TRAINING_SHEETS_SENTRY_DSN")]
    pub sentry_dsn: Option<String>,
}

impl TrainingSheetsConfig {
    pub fn load() -> Result<TrainingSheetsConfig, Error> {
        let c = TrainingSheetsConfig::builder()
            .env()
            .file("settings.toml")
            .load()?;

        c.parse_value_input_option()?;
        Ok(c)
    }

    pub fn parse_http_body_limit(&self) -> Result<usize, Error> {
        let size = byte_unit::Byte::parse_str(self.http_body_limit.clone(), true)?.as_u64();
        if size > 1024 * 1024 * 1024 {
            anyhow::bail!("Body size is too big: > 1GB");
        }
        Ok(size as usize)
    }

    pub fn parse_value_input_option(&self) -> Result<ValueInputOption, Error> {
        self.value_input_option.parse()
    }

    pub fn session_options(&self) -> Result<SessionOptions, Error> {
        Ok(SessionOptions {
            base_url: self.sheets_api_base_url.clone(),
            value_input_option: self.parse_value_input_option()?,
            request_timeout: Duration::from_secs(self.request_timeout_seconds),
        })
    }
}

pub(crate) static CONFIG: OnceLock<Arc<TrainingSheetsConfig>> = OnceLock::new();

pub fn get() -> Result<Arc<TrainingSheetsConfig>, Error> {
    CONFIG.get().cloned().ok_or_else(|| {
        Error::msg(
            "Configuration not loaded. Please call load_configuration() before using the configuration",
        )
    })
}

pub fn load_configuration() -> Result<(), Error> {
    // Check if the configuration has already been loaded
    if CONFIG.get().is_some() {
        return Ok(());
    }

    let config = TrainingSheetsConfig::load()?;
    CONFIG.get_or_init(|| Arc::new(config));

    Ok(())
}
