use serde::{Deserialize, Serialize};

/// Account record returned by the backend exchange.
///
/// `name` and `avatar_url` default to empty strings when absent, so partial
/// records (older stored sessions, trimmed backend payloads) still load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub login: String,
    #[serde(default)]
    pub avatar_url: String,
}

/// An authenticated session: the signed-in user plus the bearer token the
/// backend issued for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user: User,
    pub token: String,
}
