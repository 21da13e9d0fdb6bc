//! Sign-in configuration: OAuth client id and authorize endpoint.

use crate::error::SessionError;

/// Environment variable holding the OAuth application's client id.
pub const CLIENT_ID_ENV: &str = "GITHUB_CLIENT_ID";

/// Scope requested at sign-in: read-only access to the user's profile.
pub const SCOPE: &str = "read:user";

const DEFAULT_AUTHORIZE_ENDPOINT: &str = "https://github.com/login/oauth/authorize";

/// Configuration for the browser sign-in flow.
///
/// The client id can be set explicitly or left unset, in which case it is
/// resolved from [`CLIENT_ID_ENV`] each time a sign-in starts. A missing id
/// only surfaces when someone actually signs in.
///
/// # Example
/// ```
/// use octoauth::config::SessionConfig;
///
/// let config = SessionConfig::new("abc123");
/// let url = config.authorize_url().unwrap();
/// assert!(url.contains("client_id=abc123"));
/// ```
#[derive(Debug, Clone)]
pub struct SessionConfig {
    client_id: Option<String>,
    authorize_endpoint: String,
}

impl SessionConfig {
    /// Configuration with an explicit client id.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: Some(client_id.into()),
            authorize_endpoint: DEFAULT_AUTHORIZE_ENDPOINT.to_string(),
        }
    }

    /// Configuration that resolves the client id from the environment at
    /// sign-in time. Loads `.env` if one is present.
    pub fn from_env() -> Self {
        let _ = dotenvy::dotenv();
        Self {
            client_id: None,
            authorize_endpoint: DEFAULT_AUTHORIZE_ENDPOINT.to_string(),
        }
    }

    /// Override the provider authorize endpoint. Intended for tests pointing
    /// at a local mock.
    pub fn with_authorize_endpoint(mut self, url: impl Into<String>) -> Self {
        self.authorize_endpoint = url.into();
        self
    }

    /// Resolve the client id: the explicit value wins, then the environment.
    pub fn client_id(&self) -> Result<String, SessionError> {
        if let Some(id) = &self.client_id {
            return Ok(id.clone());
        }
        std::env::var(CLIENT_ID_ENV)
            .map_err(|_| SessionError::Configuration(format!("{CLIENT_ID_ENV} is not set")))
    }

    /// Provider authorize URL for this configuration.
    pub fn authorize_url(&self) -> Result<String, SessionError> {
        let client_id = self.client_id()?;
        Ok(format!(
            "{}?client_id={client_id}&scope={SCOPE}",
            self.authorize_endpoint
        ))
    }
}
