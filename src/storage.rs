//! Key-value persistence for session data.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::SessionError;

/// Storage abstraction over opaque string keys and values.
///
/// Reading an absent key yields `Ok(None)`; removing an absent key
/// succeeds. Implementations must be safe to share across tasks.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError>;

    async fn set(&self, key: &str, value: &str) -> Result<(), SessionError>;

    async fn remove(&self, key: &str) -> Result<(), SessionError>;
}

/// File-backed store keeping one file per key under a base directory.
///
/// Key names are normalized to lowercase alphanumerics and dashes before
/// they touch the filesystem, and values are written with owner-only
/// permissions on Unix since they may contain tokens.
///
/// # Example
/// ```no_run
/// use octoauth::storage::{FileStore, KeyValueStore};
///
/// # async fn demo() -> Result<(), octoauth::error::SessionError> {
/// let store = FileStore::new_default();
/// store.set("octoauth:token", "tok-123").await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    /// Store rooted at `~/.octoauth`.
    pub fn new_default() -> Self {
        Self {
            base_dir: default_store_dir(),
        }
    }

    fn value_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(normalize_key(key))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>, SessionError> {
        match tokio::fs::read_to_string(self.value_path(key)).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(SessionError::Io(err.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), SessionError> {
        tokio::fs::create_dir_all(&self.base_dir).await?;
        let path = self.value_path(key);
        tokio::fs::write(&path, value).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o600)).await?;
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), SessionError> {
        match tokio::fs::remove_file(self.value_path(key)).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(SessionError::Io(err.to_string())),
        }
    }
}

fn default_store_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".octoauth"))
        .unwrap_or_else(|| PathBuf::from(".octoauth"))
}

fn normalize_key(key: &str) -> String {
    let normalized: String = key
        .trim()
        .chars()
        .map(|ch| {
            let lower = ch.to_ascii_lowercase();
            if lower.is_ascii_alphanumeric() || lower == '-' {
                lower
            } else {
                '-'
            }
        })
        .collect();
    if normalized.trim_matches('-').is_empty() {
        "default".to_string()
    } else {
        normalized
    }
}
