//! Session issuance, lookup and role checks.
//!
//! The session map sits behind the [`SessionStore`] trait so the in-memory
//! store can be swapped for a persistent backend without touching the HTTP
//! layer. [`AuthGate`] is what request handlers talk to.

mod credentials;
mod session;

pub use credentials::{hash_password, CredentialVerifier, UserDirectory, UserRecord};
pub use session::{InMemorySessionStore, Role, Session, SessionStore};

use crate::error::{Result, WikiError};
use std::sync::Arc;

pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized. Admin or editor access required.";

/// True iff a session is present and its role is at least `required`.
pub fn require_role(session: Option<&Session>, required: Role) -> bool {
    session.is_some_and(|s| s.role.satisfies(required))
}

/// Answers "who is this" and "may they do that" for request handlers.
#[derive(Clone)]
pub struct AuthGate {
    store: Arc<dyn SessionStore>,
}

impl AuthGate {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemorySessionStore::new()))
    }

    pub fn issue(&self, username: &str, role: Role) -> Result<String> {
        self.store.issue(username, role)
    }

    pub fn revoke(&self, token: &str) -> Option<Session> {
        self.store.revoke(token)
    }

    /// Resolve a token carried by the request, if any.
    pub fn session(&self, token: Option<&str>) -> Option<Session> {
        token.and_then(|t| self.store.lookup(t))
    }

    /// Resolve the token and check it against `required`.
    pub fn authorize(&self, token: Option<&str>, required: Role) -> Result<Session> {
        let session = self.session(token);
        if !require_role(session.as_ref(), required) {
            return Err(WikiError::Unauthorized(UNAUTHORIZED_MESSAGE.to_string()));
        }
        session.ok_or_else(|| WikiError::Unauthorized(UNAUTHORIZED_MESSAGE.to_string()))
    }
}
