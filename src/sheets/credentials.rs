use super::{SPREADSHEETS_SCOPE, SheetsError};
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::fmt::{self, Debug};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use utoipa::ToSchema;
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::{
    InstalledFlowAuthenticator, InstalledFlowReturnMethod, ServiceAccountAuthenticator,
    ServiceAccountKey,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuthKind {
    ServiceAccount,
    Oauth,
}

impl AuthKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthKind::ServiceAccount => "service_account",
            AuthKind::Oauth => "oauth",
        }
    }
}

/// Credentials accepted by [`super::SheetsService::authenticate`].
pub enum Credentials {
    ServiceAccount(Box<ServiceAccountKey>),
    /// Installed-application flow. `credentials_file` is the client secret
    /// JSON, `token_file` optionally persists the issued tokens.
    OAuth {
        credentials_file: PathBuf,
        token_file: Option<PathBuf>,
    },
}

// Keys and secrets stay out of logs.
impl Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Credentials::ServiceAccount(key) => f
                .debug_struct("ServiceAccount")
                .field("client_email", &key.client_email)
                .finish_non_exhaustive(),
            Credentials::OAuth {
                credentials_file,
                token_file,
            } => f
                .debug_struct("OAuth")
                .field("credentials_file", credentials_file)
                .field("token_file", token_file)
                .finish(),
        }
    }
}

impl Credentials {
    pub fn kind(&self) -> AuthKind {
        match self {
            Credentials::ServiceAccount(_) => AuthKind::ServiceAccount,
            Credentials::OAuth { .. } => AuthKind::Oauth,
        }
    }

    /// Parse a service account key bundle, as downloaded from the cloud console.
    pub fn service_account_from_json(value: Value) -> Result<Self, SheetsError> {
        let key: ServiceAccountKey =
            serde_json::from_value(value).map_err(SheetsError::invalid_credentials)?;
        Ok(Credentials::ServiceAccount(Box::new(key)))
    }

    pub async fn service_account_from_file(path: impl AsRef<Path>) -> Result<Self, SheetsError> {
        let key = yup_oauth2::read_service_account_key(path.as_ref())
            .await
            .map_err(SheetsError::invalid_credentials)?;
        Ok(Credentials::ServiceAccount(Box::new(key)))
    }

    pub fn oauth(credentials_file: impl Into<PathBuf>, token_file: Option<PathBuf>) -> Self {
        Credentials::OAuth {
            credentials_file: credentials_file.into(),
            token_file,
        }
    }
}

/// Source of bearer tokens for the Sheets API.
#[async_trait]
pub trait TokenProvider: Send + Sync + Debug {
    async fn access_token(&self) -> Result<String, SheetsError>;
}

/// Tokens issued by yup-oauth2, refreshed by the authenticator when needed.
pub struct OAuthTokenProvider {
    authenticator: DefaultAuthenticator,
}

impl Debug for OAuthTokenProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OAuthTokenProvider").finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenProvider for OAuthTokenProvider {
    async fn access_token(&self) -> Result<String, SheetsError> {
        let token = self.authenticator.token(&[SPREADSHEETS_SCOPE]).await?;
        token
            .token()
            .map(str::to_owned)
            .ok_or(SheetsError::MissingAccessToken)
    }
}

/// A pre-issued token, used as is.
#[derive(Clone)]
pub struct StaticToken(String);

impl StaticToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl Debug for StaticToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("StaticToken(..)")
    }
}

#[async_trait]
impl TokenProvider for StaticToken {
    async fn access_token(&self) -> Result<String, SheetsError> {
        Ok(self.0.clone())
    }
}

/// Build the token provider matching the credential kind.
pub async fn token_provider(
    credentials: Credentials,
) -> Result<Arc<dyn TokenProvider>, SheetsError> {
    let authenticator = match credentials {
        Credentials::ServiceAccount(key) => ServiceAccountAuthenticator::builder(*key)
            .build()
            .await
            .map_err(SheetsError::invalid_credentials)?,
        Credentials::OAuth {
            credentials_file,
            token_file,
        } => {
            let secret = yup_oauth2::read_application_secret(&credentials_file)
                .await
                .map_err(|e| {
                    SheetsError::InvalidCredentials(format!(
                        "{}: {}",
                        credentials_file.display(),
                        e
                    ))
                })?;
            let builder = InstalledFlowAuthenticator::builder(
                secret,
                InstalledFlowReturnMethod::HTTPRedirect,
            );
            let built = match token_file {
                Some(token_file) => builder.persist_tokens_to_disk(token_file).build().await,
                None => builder.build().await,
            };
            built.map_err(SheetsError::invalid_credentials)?
        }
    };
    Ok(Arc::new(OAuthTokenProvider { authenticator }))
}
