#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use octoauth::diagnostics::DiagnosticSink;
use octoauth::error::SessionError;
use octoauth::flow::{AuthorizeFlow, AuthorizeOutcome};
use octoauth::storage::KeyValueStore;
use octoauth::types::User;

/// In-memory store that records every mutation in call order.
#[derive(Default)]
pub struct InMemoryStore {
    values: Mutex<HashMap<String, String>>,
    events: Mutex<Vec<String>>,
    fail_set_key: Mutex<Option<String>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, key: &str, value: &str) {
        self.values
            .lock()
            .expect("store lock poisoned")
            .insert(key.to_string(), value.to_string());
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .expect("store lock poisoned")
            .get(key)
            .cloned()
    }

    /// Mutation log: `set:<key>` / `remove:<key>` entries in call order.
    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("store lock poisoned").clone()
    }

    /// Make every subsequent `set` of `key` fail with an IO error.
    pub fn fail_set_of(&self, key: &str) {
        *self.fail_set_key.lock().expect("store lock poisoned") = Some(key.to_string());
    }
}

#[async_trait]
impl KeyValueStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        Ok(self.value(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        let failing = self
            .fail_set_key
            .lock()
            .expect("store lock poisoned")
            .clone();
        if failing.as_deref() == Some(key) {
            return Err(SessionError::Io(format!("write to {key} refused")));
        }
        self.events
            .lock()
            .expect("store lock poisoned")
            .push(format!("set:{key}"));
        self.values
            .lock()
            .expect("store lock poisoned")
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SessionError> {
        self.events
            .lock()
            .expect("store lock poisoned")
            .push(format!("remove:{key}"));
        self.values.lock().expect("store lock poisoned").remove(key);
        Ok(())
    }
}

/// Store whose every operation fails, for storage error paths.
pub struct OfflineStore;

#[async_trait]
impl KeyValueStore for OfflineStore {
    async fn get(&self, _key: &str) -> Result<Option<String>, SessionError> {
        Err(SessionError::Io("storage offline".to_string()))
    }

    async fn set(&self, _key: &str, _value: &str) -> Result<(), SessionError> {
        Err(SessionError::Io("storage offline".to_string()))
    }

    async fn remove(&self, _key: &str) -> Result<(), SessionError> {
        Err(SessionError::Io("storage offline".to_string()))
    }
}

/// Flow double returning a scripted outcome; records the URL it was given.
pub struct ScriptedFlow {
    outcome: AuthorizeOutcome,
    seen_url: Mutex<Option<String>>,
}

impl ScriptedFlow {
    pub fn new(outcome: AuthorizeOutcome) -> Self {
        Self {
            outcome,
            seen_url: Mutex::new(None),
        }
    }

    pub fn success(code: &str) -> Self {
        Self::new(AuthorizeOutcome::Success {
            code: Some(code.to_string()),
            error: None,
        })
    }

    /// A completed redirect that carries a provider error instead of a code.
    pub fn denied(error: &str) -> Self {
        Self::new(AuthorizeOutcome::Success {
            code: None,
            error: Some(error.to_string()),
        })
    }

    pub fn cancelled() -> Self {
        Self::new(AuthorizeOutcome::Cancelled)
    }

    pub fn failed(message: &str) -> Self {
        Self::new(AuthorizeOutcome::Error {
            message: message.to_string(),
        })
    }

    /// URL passed to `authorize`, or `None` if the flow never ran.
    pub fn seen_url(&self) -> Option<String> {
        self.seen_url.lock().expect("flow lock poisoned").clone()
    }
}

#[async_trait]
impl AuthorizeFlow for ScriptedFlow {
    async fn authorize(&self, authorize_url: &str) -> AuthorizeOutcome {
        *self.seen_url.lock().expect("flow lock poisoned") = Some(authorize_url.to_string());
        self.outcome.clone()
    }
}

/// Sink that records every swallowed sign-in failure.
#[derive(Default)]
pub struct RecordingSink {
    failures: Mutex<Vec<String>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failures(&self) -> Vec<String> {
        self.failures.lock().expect("sink lock poisoned").clone()
    }
}

impl DiagnosticSink for RecordingSink {
    fn sign_in_failed(&self, error: &SessionError) {
        self.failures
            .lock()
            .expect("sink lock poisoned")
            .push(error.to_string());
    }
}

pub fn sample_user(id: &str, login: &str) -> User {
    User {
        id: id.to_string(),
        name: String::new(),
        login: login.to_string(),
        avatar_url: String::new(),
    }
}
