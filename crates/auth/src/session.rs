//! Local session slot.
//!
//! Exactly one token is persisted at a time; a second login overwrites the
//! first. An empty slot is the canonical "no session" state.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::claims::{SessionClaims, TokenError};
use crate::token::TokenService;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no session found")]
    NotFound,

    #[error("session expired")]
    Expired,

    #[error("session invalid")]
    Invalid,

    #[error("session storage failed: {0}")]
    Io(String),
}

impl From<std::io::Error> for SessionError {
    fn from(e: std::io::Error) -> Self {
        SessionError::Io(e.to_string())
    }
}

/// Storage for the single local session token.
pub trait SessionStore: Send + Sync {
    /// Overwrite the slot with `token`.
    fn save(&self, token: &str) -> Result<(), SessionError>;

    /// Read the slot; empty content is `None`.
    fn load(&self) -> Result<Option<String>, SessionError>;

    /// Empty the slot. Idempotent.
    fn clear(&self) -> Result<(), SessionError>;
}

impl<S: SessionStore + ?Sized> SessionStore for std::sync::Arc<S> {
    fn save(&self, token: &str) -> Result<(), SessionError> {
        (**self).save(token)
    }

    fn load(&self) -> Result<Option<String>, SessionError> {
        (**self).load()
    }

    fn clear(&self) -> Result<(), SessionError> {
        (**self).clear()
    }
}

fn non_empty(content: &str) -> Option<String> {
    let token = content.trim();
    (!token.is_empty()).then(|| token.to_string())
}

/// Plain-text file slot (no encryption at rest).
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, content: &str) -> Result<(), SessionError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| SessionError::Io("session slot lock poisoned".to_string()))?;
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.path, content)?;
        Ok(())
    }
}

impl SessionStore for FileSessionStore {
    fn save(&self, token: &str) -> Result<(), SessionError> {
        self.write(token)
    }

    fn load(&self) -> Result<Option<String>, SessionError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| SessionError::Io("session slot lock poisoned".to_string()))?;
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(non_empty(&content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn clear(&self) -> Result<(), SessionError> {
        self.write("")
    }
}

/// In-memory slot for tests and embedded use.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    slot: Mutex<String>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for InMemorySessionStore {
    fn save(&self, token: &str) -> Result<(), SessionError> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|_| SessionError::Io("session slot lock poisoned".to_string()))?;
        *slot = token.to_string();
        Ok(())
    }

    fn load(&self) -> Result<Option<String>, SessionError> {
        let slot = self
            .slot
            .lock()
            .map_err(|_| SessionError::Io("session slot lock poisoned".to_string()))?;
        Ok(non_empty(&slot))
    }

    fn clear(&self) -> Result<(), SessionError> {
        self.save("")
    }
}

/// A token that passed signature and expiry checks, with its claims.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidSession {
    pub token: String,
    pub claims: SessionClaims,
}

/// The session slot paired with the token service that judges its content.
///
/// Every operation runs under one slot-level lock, so a check-then-clear in
/// [`Self::get_valid`] never wipes a token saved concurrently by a login.
#[derive(Debug)]
pub struct SessionSlot<S> {
    store: S,
    tokens: TokenService,
    guard: Mutex<()>,
}

impl<S: SessionStore> SessionSlot<S> {
    pub fn new(store: S, tokens: TokenService) -> Self {
        Self {
            store,
            tokens,
            guard: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn tokens(&self) -> &TokenService {
        &self.tokens
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, SessionError> {
        self.guard
            .lock()
            .map_err(|_| SessionError::Io("session slot lock poisoned".to_string()))
    }

    pub fn save(&self, token: &str) -> Result<(), SessionError> {
        let _guard = self.lock()?;
        self.store.save(token)
    }

    pub fn load(&self) -> Result<Option<String>, SessionError> {
        let _guard = self.lock()?;
        self.store.load()
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        let _guard = self.lock()?;
        self.store.clear()
    }

    /// Empty the slot only if it still holds `token`.
    ///
    /// Returns whether the slot was cleared.
    pub fn clear_token(&self, token: &str) -> Result<bool, SessionError> {
        let _guard = self.lock()?;
        if self.store.load()?.as_deref() != Some(token) {
            return Ok(false);
        }
        self.store.clear()?;
        Ok(true)
    }

    /// Load and verify the persisted token.
    ///
    /// An expired or invalid token is cleared from the slot before the error
    /// is returned, so it can never be retried.
    pub fn get_valid(&self, now: DateTime<Utc>) -> Result<ValidSession, SessionError> {
        let _guard = self.lock()?;
        let token = self.store.load()?.ok_or(SessionError::NotFound)?;

        match self.tokens.decode(&token, now) {
            Ok(claims) => Ok(ValidSession { token, claims }),
            Err(err) => {
                self.store.clear()?;
                tracing::warn!(reason = %err, "cleared stale session token");
                Err(match err {
                    TokenError::Expired => SessionError::Expired,
                    TokenError::Invalid | TokenError::Encode(_) => SessionError::Invalid,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use epicevents_core::UserId;
    use std::sync::{Arc, mpsc};
    use std::thread;

    use crate::Role;

    fn tokens() -> TokenService {
        TokenService::new(b"session-test-secret", Duration::hours(24))
    }

    #[test]
    fn file_slot_save_load_clear() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSessionStore::new(dir.path().join(".epic_token"));

        assert_eq!(store.load().unwrap(), None);

        store.save("abc.def.ghi").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("abc.def.ghi"));

        store.save("second").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("second"));

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
        assert!(store.path().exists());
        assert_eq!(std::fs::read_to_string(store.path()).unwrap(), "");

        store.clear().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn file_slot_creates_parent_and_trims_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join(".epic_token");
        let store = FileSessionStore::new(&path);

        store.save("first").unwrap();
        assert!(path.exists());

        std::fs::write(&path, "  token-with-newline\n").unwrap();
        assert_eq!(store.load().unwrap().as_deref(), Some("token-with-newline"));

        std::fs::write(&path, "   \n").unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn get_valid_on_empty_slot_is_not_found() {
        let slot = SessionSlot::new(InMemorySessionStore::new(), tokens());
        assert_eq!(slot.get_valid(Utc::now()), Err(SessionError::NotFound));
    }

    #[test]
    fn get_valid_returns_live_token_and_keeps_it() {
        let slot = SessionSlot::new(InMemorySessionStore::new(), tokens());
        let now = Utc::now();
        let id = UserId::new();
        let token = slot.tokens().issue(id, "EMP001", Role::Sales, now).unwrap();
        slot.save(&token).unwrap();

        let session = slot.get_valid(now).unwrap();
        assert_eq!(session.token, token);
        assert_eq!(session.claims.subject_id().unwrap(), id);
        assert_eq!(slot.load().unwrap(), Some(token));
    }

    #[test]
    fn get_valid_clears_expired_token() {
        let dir = tempfile::tempdir().unwrap();
        let slot = SessionSlot::new(FileSessionStore::new(dir.path().join(".epic_token")), tokens());
        let issued = Utc::now() - Duration::hours(25);
        let token = slot.tokens().issue(UserId::new(), "EMP001", Role::Sales, issued).unwrap();
        slot.save(&token).unwrap();

        assert_eq!(slot.get_valid(Utc::now()), Err(SessionError::Expired));
        assert_eq!(slot.load().unwrap(), None);
        assert_eq!(slot.get_valid(Utc::now()), Err(SessionError::NotFound));
    }

    #[test]
    fn get_valid_clears_invalid_token() {
        let slot = SessionSlot::new(InMemorySessionStore::new(), tokens());
        slot.save("definitely.not.a-jwt").unwrap();

        assert_eq!(slot.get_valid(Utc::now()), Err(SessionError::Invalid));
        assert_eq!(slot.load().unwrap(), None);
    }

    #[test]
    fn get_valid_rejects_token_signed_with_other_secret() {
        let slot = SessionSlot::new(InMemorySessionStore::new(), tokens());
        let foreign = TokenService::new(b"someone-else", Duration::hours(24));
        let now = Utc::now();
        let token = foreign.issue(UserId::new(), "EMP001", Role::Management, now).unwrap();
        slot.save(&token).unwrap();

        assert_eq!(slot.get_valid(now), Err(SessionError::Invalid));
        assert_eq!(slot.load().unwrap(), None);
    }

    /// Store that pauses inside its first `load` so another thread can race it.
    struct PausingStore {
        inner: InMemorySessionStore,
        loaded: Mutex<Option<mpsc::Sender<()>>>,
    }

    impl SessionStore for PausingStore {
        fn save(&self, token: &str) -> Result<(), SessionError> {
            self.inner.save(token)
        }

        fn load(&self) -> Result<Option<String>, SessionError> {
            let content = self.inner.load();
            if let Some(tx) = self.loaded.lock().unwrap().take() {
                tx.send(()).unwrap();
                thread::sleep(std::time::Duration::from_millis(50));
            }
            content
        }

        fn clear(&self) -> Result<(), SessionError> {
            self.inner.clear()
        }
    }

    #[test]
    fn clearing_stale_token_keeps_concurrent_login() {
        let (tx, rx) = mpsc::channel();
        let slot = Arc::new(SessionSlot::new(
            PausingStore {
                inner: InMemorySessionStore::new(),
                loaded: Mutex::new(Some(tx)),
            },
            tokens(),
        ));
        slot.save("stale.garbage.token").unwrap();

        let now = Utc::now();
        let fresh = slot.tokens().issue(UserId::new(), "EMP001", Role::Sales, now).unwrap();

        let racer = {
            let slot = Arc::clone(&slot);
            let fresh = fresh.clone();
            thread::spawn(move || {
                rx.recv().unwrap();
                slot.save(&fresh).unwrap();
            })
        };

        assert_eq!(slot.get_valid(now), Err(SessionError::Invalid));
        racer.join().unwrap();

        assert_eq!(slot.load().unwrap(), Some(fresh));
    }

    #[test]
    fn clear_token_leaves_newer_token_alone() {
        let slot = SessionSlot::new(InMemorySessionStore::new(), tokens());
        slot.save("newer").unwrap();

        assert!(!slot.clear_token("older").unwrap());
        assert_eq!(slot.load().unwrap().as_deref(), Some("newer"));

        assert!(slot.clear_token("newer").unwrap());
        assert_eq!(slot.load().unwrap(), None);
    }
}
