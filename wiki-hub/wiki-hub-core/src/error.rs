//! Error taxonomy shared by the session gate and the relocation pipeline.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WikiError {
    /// Malformed request, homepage violation or self-move.
    #[error("{0}")]
    Validation(String),
    /// Absent session or a role below the requirement.
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    /// The target location is already occupied.
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

pub type Result<T, E = WikiError> = std::result::Result<T, E>;

impl WikiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        Self::Internal(format!("{context}: {err}"))
    }

    /// HTTP status code the variant is reported with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
        }
    }
}
