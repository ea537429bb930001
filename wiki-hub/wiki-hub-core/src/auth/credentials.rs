use super::Role;
use anyhow::{anyhow, Context};
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use rand::{rngs::OsRng, RngCore};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{info, warn};

/// Opaque credential check used by the login endpoint.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Role of the user when the password matches.
    async fn verify(&self, username: &str, password: &str) -> Option<Role>;
}

/// Entry of the users file. `password` holds an argon2 PHC string.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    pub password: String,
    pub role: Role,
}

pub struct UserDirectory {
    users: Vec<UserRecord>,
    hasher: Argon2<'static>,
}

impl UserDirectory {
    pub fn new(users: Vec<UserRecord>) -> Self {
        Self {
            users,
            hasher: Argon2::default(),
        }
    }

    /// Load users from a JSON array. A missing file yields an empty
    /// directory so a fresh install can still serve read-only pages.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "users file not found, no one can log in");
            return Ok(Self::new(Vec::new()));
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading users file {}", path.display()))?;
        let users: Vec<UserRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing users file {}", path.display()))?;
        info!(count = users.len(), "loaded users");
        Ok(Self::new(users))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

#[async_trait]
impl CredentialVerifier for UserDirectory {
    async fn verify(&self, username: &str, password: &str) -> Option<Role> {
        let user = self.users.iter().find(|u| u.username == username)?;
        let parsed = match PasswordHash::new(&user.password) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(username, error = %e, "stored password hash is malformed");
                return None;
            }
        };
        self.hasher
            .verify_password(password.as_bytes(), &parsed)
            .ok()
            .map(|_| user.role)
    }
}

/// Produce an argon2 PHC string suitable for the users file.
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let mut salt = [0u8; 16];
    OsRng.try_fill_bytes(&mut salt)?;
    let salt = SaltString::encode_b64(&salt).map_err(|e| anyhow!(e))?;
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!(e))?;
    Ok(hash.to_string())
}
