//! Authentication configuration.
//!
//! Built once at startup and passed into the token service, the session
//! store and the authentication service.

use std::path::{Path, PathBuf};

use chrono::Duration;

/// Placeholder signing secret used when `JWT_SECRET_KEY` is unset.
///
/// Insecure: anyone who knows it can mint tokens. Only for local development.
pub const DEFAULT_SECRET_KEY: &str = "change-me-in-production";

/// Name of the session slot file under the install root.
pub const TOKEN_FILE_NAME: &str = ".epic_token";

pub const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Clone)]
pub struct AuthConfig {
    pub secret_key: String,
    pub token_ttl: Duration,
    pub token_file: PathBuf,
}

impl core::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_key", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("token_file", &self.token_file)
            .finish()
    }
}

impl AuthConfig {
    pub fn new(secret_key: impl Into<String>, install_root: impl AsRef<Path>) -> Self {
        Self {
            secret_key: secret_key.into(),
            token_ttl: Duration::hours(TOKEN_TTL_HOURS),
            token_file: install_root.as_ref().join(TOKEN_FILE_NAME),
        }
    }

    /// Read configuration from the environment.
    ///
    /// - `JWT_SECRET_KEY`: signing secret (falls back to [`DEFAULT_SECRET_KEY`])
    /// - `EPIC_TOKEN_FILE`: explicit session slot path
    /// - `EPIC_HOME`: install root holding `.epic_token` (defaults to the current dir)
    pub fn from_env() -> Self {
        let secret_key = std::env::var("JWT_SECRET_KEY").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET_KEY not set; using insecure placeholder secret");
            DEFAULT_SECRET_KEY.to_string()
        });

        let token_file = match std::env::var_os("EPIC_TOKEN_FILE") {
            Some(path) => PathBuf::from(path),
            None => install_root().join(TOKEN_FILE_NAME),
        };

        Self {
            secret_key,
            token_ttl: Duration::hours(TOKEN_TTL_HOURS),
            token_file,
        }
    }

    pub fn uses_default_secret(&self) -> bool {
        self.secret_key == DEFAULT_SECRET_KEY
    }
}

fn install_root() -> PathBuf {
    std::env::var_os("EPIC_HOME")
        .map(PathBuf::from)
        .or_else(|| std::env::current_dir().ok())
        .unwrap_or_else(|| PathBuf::from("."))
}
