use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use epicevents_core::{DomainResult, UserId};

use crate::Role;

/// Session token claims.
///
/// `iat`/`exp` are numeric timestamps (seconds since the epoch) as in any JWT;
/// `sub` is the stringified user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: String,
    pub employee_number: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl SessionClaims {
    pub fn new(
        subject: UserId,
        employee_number: impl Into<String>,
        role: Role,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    ) -> Self {
        Self {
            sub: subject.to_string(),
            employee_number: employee_number.into(),
            role,
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    pub fn subject_id(&self) -> DomainResult<UserId> {
        self.sub.parse()
    }

    /// Lifetime the token was issued with, in seconds.
    pub fn lifetime_secs(&self) -> i64 {
        self.exp - self.iat
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("token has expired")]
    Expired,

    #[error("token is invalid")]
    Invalid,

    #[error("token could not be signed: {0}")]
    Encode(String),
}

/// Check the time window of already signature-verified claims.
pub fn validate_claims(claims: &SessionClaims, now: DateTime<Utc>) -> Result<(), TokenError> {
    if claims.exp <= claims.iat {
        return Err(TokenError::Invalid);
    }
    if claims.exp <= now.timestamp() {
        return Err(TokenError::Expired);
    }
    Ok(())
}
