//! octoauth: client-side session management for GitHub-OAuth apps.
//!
//! Signs users in through the provider's browser authorization flow,
//! exchanges the resulting code for an application token via the app's own
//! backend, and persists the session locally so it survives restarts. The
//! [`SessionManager`] ties the pieces together; every collaborator behind it
//! (storage, flow, diagnostics) is a trait, so tests run fully in-process.
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use octoauth::api::ApiClient;
//! use octoauth::config::SessionConfig;
//! use octoauth::flow::LoopbackFlow;
//! use octoauth::manager::SessionManager;
//! use octoauth::storage::FileStore;
//!
//! # async fn example() -> Result<(), octoauth::error::SessionError> {
//! let manager = SessionManager::new(
//!     SessionConfig::from_env(),
//!     Arc::new(ApiClient::new("http://localhost:4000")),
//!     Arc::new(FileStore::new_default()),
//!     Arc::new(LoopbackFlow::new()),
//! );
//!
//! // Pick up a persisted session, then fall back to the browser flow.
//! manager.restore().await?;
//! if manager.current_user().is_none() {
//!     manager.sign_in().await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod flow;
pub mod manager;
pub mod storage;
pub mod types;

pub use api::ApiClient;
pub use config::SessionConfig;
pub use diagnostics::{DiagnosticSink, TracingSink};
pub use error::SessionError;
pub use flow::{AuthorizeFlow, AuthorizeOutcome, LoopbackFlow};
pub use manager::SessionManager;
pub use storage::{FileStore, KeyValueStore};
pub use types::{Session, User};
