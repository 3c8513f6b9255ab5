//! `epicevents-auth`: who is acting, and what they may do.
//!
//! Credential hashing, session tokens, local session persistence, the role
//! capability table, ownership policy and the authorization gate. Decoupled
//! from any storage backend beyond the traits it declares.

pub mod authorize;
pub mod claims;
pub mod config;
pub mod directory;
pub mod error;
pub mod ownership;
pub mod password;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod service;
pub mod session;
pub mod token;
pub mod user;

pub use authorize::{
    AuthzError, Grant, authorize, authorize_any_scope, authorize_owned, require_role,
};
pub use claims::{SessionClaims, TokenError, validate_claims};
pub use config::AuthConfig;
pub use directory::{InMemoryUserDirectory, UserDirectory};
pub use error::AuthError;
pub use ownership::{ClientLinked, SalesOwned, SupportAssigned};
pub use password::{CredentialError, CredentialStore, HashParams};
pub use permissions::{Capability, caps};
pub use principal::Principal;
pub use roles::{Role, capabilities_of, has_capability};
pub use service::AuthService;
pub use session::{
    FileSessionStore, InMemorySessionStore, SessionError, SessionSlot, SessionStore, ValidSession,
};
pub use token::TokenService;
pub use user::{NewUser, User, UserUpdate};
