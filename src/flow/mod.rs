//! Browser authorization flows.
//!
//! A flow takes the provider authorize URL, gets the user in front of it,
//! and reports how the attempt ended. [`LoopbackFlow`] is the production
//! implementation: system browser plus a loopback redirect listener. Tests
//! inject scripted implementations of [`AuthorizeFlow`] instead.

pub mod callback;

pub use callback::{CallbackListener, RedirectParams};

use std::time::Duration;

use async_trait::async_trait;

/// How a browser authorization attempt ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizeOutcome {
    /// The provider redirected back to the app. A redirect is not yet an
    /// authorization: the params may carry a provider error instead of a
    /// code, and callers decide what to do with each combination.
    Success {
        code: Option<String>,
        error: Option<String>,
    },
    /// The user dismissed the flow, or it timed out waiting for them.
    Cancelled,
    /// The flow failed before any redirect was observed.
    Error { message: String },
}

/// A browser-based authorization flow.
#[async_trait]
pub trait AuthorizeFlow: Send + Sync {
    async fn authorize(&self, authorize_url: &str) -> AuthorizeOutcome;
}

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Authorization through the system browser with a loopback redirect.
///
/// Binds a [`CallbackListener`] on an ephemeral port, appends its address as
/// the `redirect_uri`, opens the system browser at the resulting URL, and
/// waits up to the configured timeout for the provider to redirect back.
/// Requires an OAuth app whose callback URL accepts loopback addresses.
pub struct LoopbackFlow {
    timeout: Duration,
}

impl LoopbackFlow {
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override how long to wait for the redirect before treating the
    /// attempt as dismissed.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl Default for LoopbackFlow {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuthorizeFlow for LoopbackFlow {
    async fn authorize(&self, authorize_url: &str) -> AuthorizeOutcome {
        let listener = match CallbackListener::bind().await {
            Ok(listener) => listener,
            Err(err) => {
                return AuthorizeOutcome::Error {
                    message: format!("callback listener failed to bind: {err}"),
                }
            }
        };

        let url = match with_redirect_uri(authorize_url, &listener.redirect_uri()) {
            Ok(url) => url,
            Err(err) => {
                return AuthorizeOutcome::Error {
                    message: format!("invalid authorize URL: {err}"),
                }
            }
        };

        if let Err(err) = webbrowser::open(&url) {
            return AuthorizeOutcome::Error {
                message: format!("could not open the system browser: {err}"),
            };
        }
        tracing::debug!(timeout_secs = self.timeout.as_secs(), "waiting for redirect");

        match listener.wait_for_redirect(self.timeout).await {
            Ok(Some(params)) => AuthorizeOutcome::Success {
                code: params.code,
                error: params.error,
            },
            Ok(None) => AuthorizeOutcome::Cancelled,
            Err(err) => AuthorizeOutcome::Error {
                message: err.to_string(),
            },
        }
    }
}

fn with_redirect_uri(authorize_url: &str, redirect_uri: &str) -> Result<String, url::ParseError> {
    let mut url = url::Url::parse(authorize_url)?;
    url.query_pairs_mut().append_pair("redirect_uri", redirect_uri);
    Ok(url.into())
}
