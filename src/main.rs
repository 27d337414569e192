#![forbid(unsafe_code)]
use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{Level, event, info, warn};
use training_sheets::config::{self, load_configuration};
use training_sheets::http::server::run_http_server;
use training_sheets::http::state::{DefaultRanges, HttpServerState};
use training_sheets::sheets::{Credentials, SheetsService};

fn main() -> Result<()> {
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|e| anyhow::anyhow!("Failed to install CryptoProvider: {:?}", e))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to create Tokio runtime")?;

    runtime.block_on(async_main())
}

async fn async_main() -> Result<()> {
    // Initialize tracing subscriber for HTTP request logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=info".into()),
        )
        .init();

    // Load configuration
    load_configuration().context("Failed to load configuration")?;
    let config = config::get().context("Failed to get configuration")?;

    // Initialize Sentry if DSN is provided
    let _sentry = config.sentry_dsn.as_ref().map(|dsn| {
        sentry::init((
            dsn.clone(),
            sentry::ClientOptions {
                release: sentry::release_name!(),
                ..Default::default()
            },
        ))
    });

    let sheets = Arc::new(SheetsService::new(
        config
            .session_options()
            .context("Invalid Sheets API configuration")?,
    ));

    // A failed startup authentication leaves the service running unauthenticated
    if let Some(path) = config.service_account_file.as_deref() {
        match Credentials::service_account_from_file(path).await {
            Ok(credentials) => {
                if sheets.authenticate(credentials).await {
                    info!("Authenticated at startup with {}", path);
                } else {
                    warn!("Startup authentication with {} failed", path);
                }
            }
            Err(err) => warn!("Cannot load service account key {}: {}", path, err),
        }
    }

    let address = SocketAddr::from((config.endpoint, config.port));

    info!("Starting HTTP server on {}...", address);
    match run_http_server(
        HttpServerState {
            name: Arc::new("Training Sheets".to_string()),
            sheets,
            ranges: Arc::new(DefaultRanges {
                read: config.default_read_range.clone(),
                write: config.default_write_range.clone(),
            }),
        },
        address,
    )
    .await
    {
        Ok(_) => {
            event!(Level::INFO, "HTTP server stopped gracefully");
            Ok(())
        }
        Err(err) => {
            event!(Level::ERROR, "HTTP server failed to start: {}", err);
            Err(err)
        }
    }
}
