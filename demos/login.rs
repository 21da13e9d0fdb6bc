//! Restore-or-sign-in walkthrough.
//!
//! Needs `GITHUB_CLIENT_ID` in the environment (or a `.env` file) and a
//! backend exposing `POST /authenticate` at `OCTOAUTH_API_URL`
//! (default `http://localhost:4000`).
//!
//! ```sh
//! cargo run --example login
//! ```

use std::sync::Arc;

use octoauth::api::ApiClient;
use octoauth::config::SessionConfig;
use octoauth::error::SessionError;
use octoauth::flow::LoopbackFlow;
use octoauth::manager::SessionManager;
use octoauth::storage::FileStore;

#[tokio::main]
async fn main() -> Result<(), SessionError> {
    let api_url =
        std::env::var("OCTOAUTH_API_URL").unwrap_or_else(|_| "http://localhost:4000".to_string());

    let manager = SessionManager::new(
        SessionConfig::from_env(),
        Arc::new(ApiClient::new(api_url)),
        Arc::new(FileStore::new_default()),
        Arc::new(LoopbackFlow::new()),
    );

    manager.restore().await?;
    if let Some(user) = manager.current_user() {
        println!("Restored session for @{}", user.login);
        return Ok(());
    }

    println!("No stored session, opening the browser...");
    manager.sign_in().await;

    match manager.current_user() {
        Some(user) => println!("Signed in as @{} ({})", user.login, user.name),
        None => println!("Sign-in did not complete."),
    }
    Ok(())
}
