//! Password hashing and verification (Argon2id).
//!
//! Hashes are PHC strings (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`), so
//! the algorithm, salt and cost travel with the hash.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

/// Longest password accepted, in bytes.
pub const MAX_PASSWORD_BYTES: usize = 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("password cannot be empty")]
    Empty,

    #[error("password exceeds {MAX_PASSWORD_BYTES} bytes")]
    TooLong,

    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// Argon2 work-factor parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashParams {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl HashParams {
    /// Cheapest parameters the algorithm accepts. Tests only.
    pub const MINIMAL: HashParams = HashParams {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    };

    fn to_argon2(self) -> Result<Argon2<'static>, CredentialError> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| CredentialError::Hash(format!("argon2 params: {e}")))?;
        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for HashParams {
    /// Argon2id RFC 9106 second recommendation; roughly bcrypt cost 12 on commodity hardware.
    fn default() -> Self {
        Self {
            memory_kib: 19456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

fn check_input(password: &str) -> Result<(), CredentialError> {
    if password.is_empty() {
        return Err(CredentialError::Empty);
    }
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(CredentialError::TooLong);
    }
    Ok(())
}

/// Hash a password with a fresh random salt and the given cost.
pub fn hash_with_params(password: &str, params: HashParams) -> Result<String, CredentialError> {
    check_input(password)?;
    let salt = SaltString::generate(&mut OsRng);
    let hash = params
        .to_argon2()?
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| CredentialError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// Hash a password with the default cost.
pub fn hash(password: &str) -> Result<String, CredentialError> {
    hash_with_params(password, HashParams::default())
}

/// Check a password against a stored hash.
///
/// The cost and salt are read from the hash itself. A malformed hash verifies
/// as `false`; the comparison inside `argon2` is constant-time.
pub fn verify(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// Hashes passwords with a fixed cost; owned by the authentication service.
#[derive(Debug, Clone, Copy, Default)]
pub struct CredentialStore {
    params: HashParams,
}

impl CredentialStore {
    pub fn new(params: HashParams) -> Self {
        Self { params }
    }

    pub fn hash(&self, password: &str) -> Result<String, CredentialError> {
        hash_with_params(password, self.params)
    }

    pub fn verify(&self, password: &str, hash: &str) -> bool {
        verify(password, hash)
    }
}
