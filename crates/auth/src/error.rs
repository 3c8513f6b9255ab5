use thiserror::Error;

use epicevents_core::DomainError;

use crate::authorize::AuthzError;
use crate::claims::TokenError;
use crate::password::CredentialError;
use crate::session::SessionError;

/// Message shared by every failed login, whatever the cause.
pub const INVALID_CREDENTIALS: &str = "invalid email or password";

pub const MSG_NO_SESSION: &str = "please log in";
pub const MSG_SESSION_EXPIRED: &str = "session expired, please log in again";
pub const MSG_SESSION_INVALID: &str = "invalid session, please log in again";
pub const MSG_USER_GONE: &str = "user not found, please log in again";

/// Authentication service error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Credential(#[from] CredentialError),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error("session storage failed: {0}")]
    Storage(String),
}

impl AuthError {
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Domain(DomainError::authentication(msg))
    }

    pub fn is_authentication(&self) -> bool {
        matches!(self, Self::Domain(DomainError::Authentication(_)))
    }

    pub fn is_permission_denied(&self) -> bool {
        matches!(self, Self::Domain(DomainError::PermissionDenied(_)))
    }
}

impl From<AuthzError> for DomainError {
    fn from(e: AuthzError) -> Self {
        DomainError::permission_denied(e.to_string())
    }
}

impl From<AuthzError> for AuthError {
    fn from(e: AuthzError) -> Self {
        Self::Domain(e.into())
    }
}

impl From<SessionError> for AuthError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::NotFound => Self::authentication(MSG_NO_SESSION),
            SessionError::Expired => Self::authentication(MSG_SESSION_EXPIRED),
            SessionError::Invalid => Self::authentication(MSG_SESSION_INVALID),
            SessionError::Io(msg) => Self::Storage(msg),
        }
    }
}

impl From<AuthError> for DomainError {
    /// Collapse into the domain taxonomy for callers that only speak it.
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::Domain(d) => d,
            AuthError::Credential(c @ (CredentialError::Empty | CredentialError::TooLong)) => {
                DomainError::validation(c.to_string())
            }
            other @ (AuthError::Credential(CredentialError::Hash(_))
            | AuthError::Token(_)
            | AuthError::Storage(_)) => DomainError::internal(other.to_string()),
        }
    }
}
