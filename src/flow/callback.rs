//! Loopback HTTP listener that receives the provider's redirect.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

use crate::error::SessionError;

const CALLBACK_PATH: &str = "/callback";

const STATUS_OK: &str = "HTTP/1.1 200 OK";
const STATUS_BAD_REQUEST: &str = "HTTP/1.1 400 Bad Request";
const STATUS_NOT_FOUND: &str = "HTTP/1.1 404 Not Found";

const LANDING_PAGE: &str =
    "<html><body><h2>Sign-in complete</h2><p>You can close this tab and return to the app.</p></body></html>";
const ERROR_PAGE: &str =
    "<html><body><h2>Sign-in did not complete</h2><p>You can close this tab and retry from the app.</p></body></html>";

/// Query parameters delivered by the provider redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectParams {
    pub code: Option<String>,
    pub error: Option<String>,
}

/// One-shot listener bound to an ephemeral loopback port.
///
/// The provider redirects the browser to [`redirect_uri`](Self::redirect_uri)
/// once the user decides; [`wait_for_redirect`](Self::wait_for_redirect)
/// blocks until that request lands or the timeout elapses.
pub struct CallbackListener {
    listener: TcpListener,
    port: u16,
}

impl CallbackListener {
    pub async fn bind() -> Result<Self, SessionError> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let port = listener.local_addr()?.port();
        tracing::debug!(port, "callback listener bound");
        Ok(Self { listener, port })
    }

    /// Redirect URI the provider should send the browser back to.
    pub fn redirect_uri(&self) -> String {
        format!("http://127.0.0.1:{}{CALLBACK_PATH}", self.port)
    }

    /// Wait for the redirect. `Ok(None)` means the timeout elapsed first.
    ///
    /// Requests for other paths (favicons and the like) are answered with a
    /// 404 and skipped; only a hit on the callback path resolves the wait.
    pub async fn wait_for_redirect(
        self,
        timeout: Duration,
    ) -> Result<Option<RedirectParams>, SessionError> {
        match tokio::time::timeout(timeout, accept_redirect(&self.listener)).await {
            Ok(result) => result.map(Some),
            Err(_) => Ok(None),
        }
    }
}

async fn accept_redirect(listener: &TcpListener) -> Result<RedirectParams, SessionError> {
    loop {
        let (mut socket, _) = listener.accept().await?;
        let mut buffer = vec![0u8; 8192];
        let size = socket.read(&mut buffer).await?;
        if size == 0 {
            continue;
        }
        let request = String::from_utf8_lossy(&buffer[..size]);

        let Some(target) = request_target(&request) else {
            respond(&mut socket, STATUS_BAD_REQUEST, ERROR_PAGE).await;
            continue;
        };
        let Ok(url) = url::Url::parse(&format!("http://127.0.0.1{target}")) else {
            respond(&mut socket, STATUS_BAD_REQUEST, ERROR_PAGE).await;
            continue;
        };
        if url.path() != CALLBACK_PATH {
            respond(&mut socket, STATUS_NOT_FOUND, ERROR_PAGE).await;
            continue;
        }

        match redirect_params(&url) {
            Some(params) => {
                let (status, page) = if params.error.is_some() {
                    (STATUS_BAD_REQUEST, ERROR_PAGE)
                } else {
                    (STATUS_OK, LANDING_PAGE)
                };
                respond(&mut socket, status, page).await;
                tracing::debug!("authorization redirect received");
                return Ok(params);
            }
            None => {
                respond(&mut socket, STATUS_BAD_REQUEST, ERROR_PAGE).await;
                return Err(SessionError::InvalidResponse(
                    "redirect carried neither code nor error".to_string(),
                ));
            }
        }
    }
}

/// Request target from the first line of an HTTP request, GET only.
fn request_target(request: &str) -> Option<&str> {
    let first_line = request.lines().next()?;
    let mut parts = first_line.split_whitespace();
    let method = parts.next()?;
    let target = parts.next()?;
    if method != "GET" || target.is_empty() {
        return None;
    }
    Some(target)
}

/// `code` and `error` query parameters, or `None` when both are absent.
fn redirect_params(url: &url::Url) -> Option<RedirectParams> {
    let mut code = None;
    let mut error = None;
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "code" => code = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            _ => {}
        }
    }
    if code.is_none() && error.is_none() {
        return None;
    }
    Some(RedirectParams { code, error })
}

async fn respond(socket: &mut TcpStream, status: &str, body: &str) {
    let response = format!(
        "{status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(target: &str) -> Option<RedirectParams> {
        let url = url::Url::parse(&format!("http://127.0.0.1{target}")).unwrap();
        redirect_params(&url)
    }

    #[test]
    fn request_target_accepts_get_only() {
        assert_eq!(
            request_target("GET /callback?code=abc HTTP/1.1\r\nHost: x\r\n\r\n"),
            Some("/callback?code=abc")
        );
        assert_eq!(request_target("POST /callback HTTP/1.1\r\n\r\n"), None);
        assert_eq!(request_target(""), None);
        assert_eq!(request_target("GARBAGE"), None);
    }

    #[test]
    fn redirect_params_extracts_code_and_error() {
        let params = parse("/callback?code=abc&state=xyz").unwrap();
        assert_eq!(params.code.as_deref(), Some("abc"));
        assert_eq!(params.error, None);

        let params = parse("/callback?error=access_denied").unwrap();
        assert_eq!(params.code, None);
        assert_eq!(params.error.as_deref(), Some("access_denied"));

        let params = parse("/callback?code=a%2Fb").unwrap();
        assert_eq!(params.code.as_deref(), Some("a/b"));

        assert_eq!(parse("/callback?state=only"), None);
        assert_eq!(parse("/callback"), None);
    }

    async fn send_request(port: u16, target: &str) -> String {
        let mut socket = TcpStream::connect(("127.0.0.1", port)).await.unwrap();
        let request = format!("GET {target} HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n");
        socket.write_all(request.as_bytes()).await.unwrap();
        let mut response = String::new();
        socket.read_to_string(&mut response).await.unwrap();
        response
    }

    #[tokio::test]
    async fn delivers_code_from_callback_request() {
        let listener = CallbackListener::bind().await.unwrap();
        let port = listener.port;
        let wait = tokio::spawn(listener.wait_for_redirect(Duration::from_secs(5)));

        let response = send_request(port, "/callback?code=abc&state=xyz").await;
        assert!(response.starts_with(STATUS_OK));
        assert!(response.contains("Sign-in complete"));

        let params = wait.await.unwrap().unwrap().unwrap();
        assert_eq!(params.code.as_deref(), Some("abc"));
        assert_eq!(params.error, None);
    }

    #[tokio::test]
    async fn delivers_provider_error_with_error_page() {
        let listener = CallbackListener::bind().await.unwrap();
        let port = listener.port;
        let wait = tokio::spawn(listener.wait_for_redirect(Duration::from_secs(5)));

        let response = send_request(port, "/callback?error=access_denied").await;
        assert!(response.starts_with(STATUS_BAD_REQUEST));

        let params = wait.await.unwrap().unwrap().unwrap();
        assert_eq!(params.error.as_deref(), Some("access_denied"));
    }

    #[tokio::test]
    async fn skips_stray_requests_before_the_callback() {
        let listener = CallbackListener::bind().await.unwrap();
        let port = listener.port;
        let wait = tokio::spawn(listener.wait_for_redirect(Duration::from_secs(5)));

        let response = send_request(port, "/favicon.ico").await;
        assert!(response.starts_with(STATUS_NOT_FOUND));

        let response = send_request(port, "/callback?code=after-favicon").await;
        assert!(response.starts_with(STATUS_OK));

        let params = wait.await.unwrap().unwrap().unwrap();
        assert_eq!(params.code.as_deref(), Some("after-favicon"));
    }

    #[tokio::test]
    async fn times_out_as_none() {
        let listener = CallbackListener::bind().await.unwrap();
        let result = listener.wait_for_redirect(Duration::from_millis(50)).await;
        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn callback_without_code_or_error_is_rejected() {
        let listener = CallbackListener::bind().await.unwrap();
        let port = listener.port;
        let wait = tokio::spawn(listener.wait_for_redirect(Duration::from_secs(5)));

        let response = send_request(port, "/callback?state=only").await;
        assert!(response.starts_with(STATUS_BAD_REQUEST));

        let result = wait.await.unwrap();
        assert!(matches!(result, Err(SessionError::InvalidResponse(_))));
    }
}
