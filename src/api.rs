//! Backend API client carrying the session's bearer credential.

use std::sync::RwLock;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::SessionError;
use crate::types::Session;

/// HTTP client for the application backend.
///
/// Holds the default `Authorization` header that is attached to every
/// request once a session exists, plus the `/authenticate` code exchange.
/// The exchange deliberately runs without a request timeout so a slow
/// backend stalls the sign-in rather than failing it.
///
/// # Example
/// ```
/// use octoauth::api::ApiClient;
///
/// let api = ApiClient::new("https://api.example.com");
/// api.set_bearer_token("tok-123");
/// assert_eq!(api.authorization().as_deref(), Some("Bearer tok-123"));
/// ```
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    authorization: RwLock<Option<String>>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            authorization: RwLock::new(None),
        }
    }

    /// Attach `Bearer <token>` as the default credential for every
    /// subsequent request.
    pub fn set_bearer_token(&self, token: &str) {
        *self.authorization.write().unwrap() = Some(format!("Bearer {token}"));
    }

    /// Detach the default credential.
    pub fn clear_bearer_token(&self) {
        *self.authorization.write().unwrap() = None;
    }

    /// Current default `Authorization` header value, if any.
    pub fn authorization(&self) -> Option<String> {
        self.authorization.read().unwrap().clone()
    }

    /// Exchange an authorization code for a session.
    ///
    /// Posts `{"code": ...}` to `/authenticate`; the key is omitted entirely
    /// when the provider redirect carried no code.
    pub async fn authenticate(&self, code: Option<&str>) -> Result<Session, SessionError> {
        self.post_json("/authenticate", &ExchangeRequest { code }).await
    }

    /// POST a JSON body to `path` and parse a JSON response.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, SessionError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.post(self.url(path)).json(body);
        self.execute(path, request).await
    }

    /// GET `path` and parse a JSON response.
    pub async fn get_json<T>(&self, path: &str) -> Result<T, SessionError>
    where
        T: DeserializeOwned,
    {
        let request = self.http.get(self.url(path));
        self.execute(path, request).await
    }

    async fn execute<T>(
        &self,
        path: &str,
        mut request: reqwest::RequestBuilder,
    ) -> Result<T, SessionError>
    where
        T: DeserializeOwned,
    {
        if let Some(authorization) = self.authorization() {
            request = request.header("Authorization", authorization);
        }
        let resp = request.send().await?;
        if !resp.status().is_success() {
            return Err(SessionError::InvalidResponse(format!(
                "{path} failed with status {}",
                resp.status()
            )));
        }
        Ok(resp.json().await?)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct ExchangeRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'a str>,
}
