//! Session lifecycle: restore at startup, browser sign-in, sign-out.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use crate::api::ApiClient;
use crate::config::SessionConfig;
use crate::diagnostics::{DiagnosticSink, TracingSink};
use crate::error::SessionError;
use crate::flow::{AuthorizeFlow, AuthorizeOutcome};
use crate::storage::KeyValueStore;
use crate::types::User;

/// Storage key holding the signed-in user as JSON.
pub const USER_KEY: &str = "octoauth:user";
/// Storage key holding the raw bearer token.
pub const TOKEN_KEY: &str = "octoauth:token";

/// Client-side session manager.
///
/// Owns the signed-in user, the in-flight flag, and the wiring between the
/// authorization flow, the backend exchange, storage, and the API client's
/// default credential. All collaborators are injected, so tests swap in
/// scripted flows and in-memory stores.
///
/// The user and token persist under two separate keys with no transaction
/// between the writes; a crash in the gap can strand one key, and
/// [`restore`](Self::restore) treats such a partial pair as signed out.
///
/// # Example
/// ```no_run
/// use std::sync::Arc;
///
/// use octoauth::api::ApiClient;
/// use octoauth::config::SessionConfig;
/// use octoauth::flow::LoopbackFlow;
/// use octoauth::manager::SessionManager;
/// use octoauth::storage::FileStore;
///
/// # async fn example() -> Result<(), octoauth::error::SessionError> {
/// let manager = SessionManager::new(
///     SessionConfig::from_env(),
///     Arc::new(ApiClient::new("http://localhost:4000")),
///     Arc::new(FileStore::new_default()),
///     Arc::new(LoopbackFlow::new()),
/// );
/// manager.restore().await?;
/// if manager.current_user().is_none() {
///     manager.sign_in().await;
/// }
/// # Ok(())
/// # }
/// ```
pub struct SessionManager {
    config: SessionConfig,
    api: Arc<ApiClient>,
    storage: Arc<dyn KeyValueStore>,
    flow: Arc<dyn AuthorizeFlow>,
    diagnostics: Arc<dyn DiagnosticSink>,
    user: RwLock<Option<User>>,
    signing_in: AtomicBool,
}

impl SessionManager {
    /// New manager with the default [`TracingSink`] for diagnostics.
    ///
    /// Starts in the in-flight state; call [`restore`](Self::restore) to
    /// load any persisted session and clear it.
    pub fn new(
        config: SessionConfig,
        api: Arc<ApiClient>,
        storage: Arc<dyn KeyValueStore>,
        flow: Arc<dyn AuthorizeFlow>,
    ) -> Self {
        Self {
            config,
            api,
            storage,
            flow,
            diagnostics: Arc::new(TracingSink),
            user: RwLock::new(None),
            signing_in: AtomicBool::new(true),
        }
    }

    /// Replace the diagnostic sink.
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.diagnostics = sink;
        self
    }

    /// Currently signed-in user, if any.
    pub fn current_user(&self) -> Option<User> {
        self.user.read().unwrap().clone()
    }

    /// Whether a restore or sign-in is currently in flight. True from
    /// construction until the first [`restore`](Self::restore) completes.
    pub fn is_signing_in(&self) -> bool {
        self.signing_in.load(Ordering::SeqCst)
    }

    /// Backend client carrying this session's credential.
    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    /// Load a persisted session into memory.
    ///
    /// Only a complete pair counts: with both the user record and the token
    /// present, the token becomes the API client's default credential and
    /// the stored user becomes current. Anything less leaves the manager
    /// signed out. The in-flight flag clears on every exit path, including
    /// storage and parse errors.
    pub async fn restore(&self) -> Result<(), SessionError> {
        self.signing_in.store(true, Ordering::SeqCst);
        let result = self.load_stored_session().await;
        self.signing_in.store(false, Ordering::SeqCst);
        result
    }

    async fn load_stored_session(&self) -> Result<(), SessionError> {
        let stored_user = self.storage.get(USER_KEY).await?;
        let stored_token = self.storage.get(TOKEN_KEY).await?;
        if let (Some(raw_user), Some(token)) = (stored_user, stored_token) {
            let user: User = serde_json::from_str(&raw_user)?;
            self.api.set_bearer_token(&token);
            tracing::debug!(login = %user.login, "session restored");
            *self.user.write().unwrap() = Some(user);
        }
        Ok(())
    }

    /// Run the browser sign-in flow and exchange the result for a session.
    ///
    /// On success the token becomes the API client's default credential, the
    /// user and token are persisted, and the user becomes current, in that
    /// order. Cancelled flows and explicit denials end silently signed out.
    /// Every other failure is reported to the diagnostic sink and swallowed.
    /// The in-flight flag is set for the duration and cleared on every exit
    /// path.
    pub async fn sign_in(&self) {
        self.signing_in.store(true, Ordering::SeqCst);
        if let Err(error) = self.run_sign_in().await {
            self.diagnostics.sign_in_failed(&error);
        }
        self.signing_in.store(false, Ordering::SeqCst);
    }

    async fn run_sign_in(&self) -> Result<(), SessionError> {
        let authorize_url = self.config.authorize_url()?;
        let outcome = self.flow.authorize(&authorize_url).await;
        let (code, error) = match outcome {
            AuthorizeOutcome::Success { code, error } => (code, error),
            AuthorizeOutcome::Cancelled => return Ok(()),
            AuthorizeOutcome::Error { message } => return Err(SessionError::Flow(message)),
        };
        if error.as_deref() == Some("access_denied") {
            return Ok(());
        }
        // Only an explicit denial short-circuits here. Any other provider
        // error rides into the exchange, code or no code, and fails there.
        let session = self.api.authenticate(code.as_deref()).await?;
        self.api.set_bearer_token(&session.token);
        self.storage
            .set(USER_KEY, &serde_json::to_string(&session.user)?)
            .await?;
        self.storage.set(TOKEN_KEY, &session.token).await?;
        *self.user.write().unwrap() = Some(session.user);
        Ok(())
    }

    /// Discard the session.
    ///
    /// Removes both storage keys, clears the in-memory user, and detaches
    /// the API client's default credential. Safe to call when already
    /// signed out.
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        self.storage.remove(USER_KEY).await?;
        self.storage.remove(TOKEN_KEY).await?;
        *self.user.write().unwrap() = None;
        self.api.clear_bearer_token();
        Ok(())
    }
}
