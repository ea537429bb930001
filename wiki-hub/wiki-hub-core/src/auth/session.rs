use crate::error::{Result, WikiError};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

const TOKEN_BYTES: usize = 32;

/// Ordered so that `Admin > Editor > Viewer`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Viewer,
    Editor,
    Admin,
}

impl Role {
    pub fn satisfies(self, required: Role) -> bool {
        self >= required
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Viewer => "viewer",
            Role::Editor => "editor",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = WikiError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "viewer" => Ok(Role::Viewer),
            "editor" => Ok(Role::Editor),
            "admin" => Ok(Role::Admin),
            other => Err(WikiError::validation(format!("unknown role: {other}"))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

pub trait SessionStore: Send + Sync {
    /// Store a new session under a fresh random token and return the token.
    fn issue(&self, username: &str, role: Role) -> Result<String>;

    fn lookup(&self, token: &str) -> Option<Session>;

    /// Remove the session; unknown tokens are ignored.
    fn revoke(&self, token: &str) -> Option<Session>;
}

/// Process-local session map. Lookups share the read lock; issue and
/// revoke take it exclusively. Sessions are never swept: expiry is left
/// to the cookie lifetime.
#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

fn generate_token() -> Result<String> {
    let mut buf = [0u8; TOKEN_BYTES];
    OsRng
        .try_fill_bytes(&mut buf)
        .map_err(|e| WikiError::internal("entropy source unavailable", e))?;
    Ok(URL_SAFE_NO_PAD.encode(buf))
}

impl SessionStore for InMemorySessionStore {
    fn issue(&self, username: &str, role: Role) -> Result<String> {
        loop {
            let token = generate_token()?;
            let mut sessions = self.sessions.write();
            if let Entry::Vacant(slot) = sessions.entry(token.clone()) {
                slot.insert(Session {
                    token: token.clone(),
                    username: username.to_string(),
                    role,
                    created_at: Utc::now(),
                });
                debug!(username, %role, "session issued");
                return Ok(token);
            }
        }
    }

    fn lookup(&self, token: &str) -> Option<Session> {
        self.sessions.read().get(token).cloned()
    }

    fn revoke(&self, token: &str) -> Option<Session> {
        self.sessions.write().remove(token)
    }
}
