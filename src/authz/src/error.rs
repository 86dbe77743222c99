//! Error types for the authorization engine

use thiserror::Error;

use crate::identity::IdentifierError;
use crate::scope::ScopeError;

/// Authorization engine errors
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Malformed resource scope (VRN)
    #[error("Invalid scope: {0}")]
    InvalidScope(#[from] ScopeError),

    /// Malformed user identifier (URN)
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(#[from] IdentifierError),

    /// No policy registered for a permission name
    #[error("Policy not found: {0}")]
    PolicyNotFound(String),

    /// Policy cannot be registered or evaluated
    #[error("Invalid policy: {0}")]
    PolicyInvalid(String),

    /// Failure reported by the remote authority, passed through unchanged
    #[error(transparent)]
    Upstream(anyhow::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// No process-wide context installed, or installed twice
    #[error("Context error: {0}")]
    Context(String),
}

impl AuthzError {
    /// Wrap an error raised by a remote collaborator
    pub fn upstream(err: impl Into<anyhow::Error>) -> Self {
        AuthzError::Upstream(err.into())
    }

    /// Whether this error came from the remote authority
    pub fn is_upstream(&self) -> bool {
        matches!(self, AuthzError::Upstream(_))
    }
}

/// Result type for authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;
