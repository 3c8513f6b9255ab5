//! Authentication service.
//!
//! Orchestrates the credential store, the token service and the session slot
//! over one local principal session (Unauthenticated -> Authenticated on
//! login, back on logout or when the slot is found stale).

use std::sync::OnceLock;

use chrono::{DateTime, Utc};

use epicevents_core::{DomainError, UserId};

use crate::authorize::require_role;
use crate::directory::UserDirectory;
use crate::error::{AuthError, INVALID_CREDENTIALS, MSG_SESSION_INVALID, MSG_USER_GONE};
use crate::password::{CredentialStore, HashParams};
use crate::session::{SessionSlot, SessionStore};
use crate::token::TokenService;
use crate::user::{NewUser, User, UserUpdate, normalize_email, normalize_employee_number};
use crate::{AuthConfig, Principal, Role};

pub struct AuthService<D, S> {
    users: D,
    credentials: CredentialStore,
    session: SessionSlot<S>,
    dummy_hash: OnceLock<Option<String>>,
}

impl<D, S> AuthService<D, S>
where
    D: UserDirectory,
    S: SessionStore,
{
    pub fn new(users: D, store: S, config: &AuthConfig) -> Self {
        Self::with_hash_params(users, store, config, HashParams::default())
    }

    pub fn with_hash_params(users: D, store: S, config: &AuthConfig, params: HashParams) -> Self {
        Self {
            users,
            credentials: CredentialStore::new(params),
            session: SessionSlot::new(store, TokenService::from_config(config)),
            dummy_hash: OnceLock::new(),
        }
    }

    pub fn users(&self) -> &D {
        &self.users
    }

    pub fn session(&self) -> &SessionSlot<S> {
        &self.session
    }

    // ─────────────────────────────────────────────────────────────────────
    // Registration
    // ─────────────────────────────────────────────────────────────────────

    /// Create a collaborator account.
    ///
    /// Only uniqueness is enforced here; field and password-strength rules
    /// belong to [`Self::create_principal`].
    pub fn register(&self, new: NewUser, now: DateTime<Utc>) -> Result<User, AuthError> {
        let email = normalize_email(&new.email);
        let employee_number = normalize_employee_number(&new.employee_number);
        self.ensure_unique(&email, &employee_number, None)?;

        let user = User {
            id: UserId::new(),
            employee_number,
            full_name: new.full_name.trim().to_string(),
            email,
            password_hash: self.credentials.hash(&new.password)?,
            role: new.role,
            active: true,
            created_at: now,
            updated_at: now,
        };
        self.users.save(user.clone());

        tracing::info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }

    fn ensure_unique(
        &self,
        email: &str,
        employee_number: &str,
        exclude: Option<UserId>,
    ) -> Result<(), AuthError> {
        let other = |u: &User| Some(u.id) != exclude;

        if self.users.find_by_email(email).is_some_and(|u| other(&u)) {
            return Err(DomainError::conflict("email address already in use").into());
        }
        if self
            .users
            .find_by_employee_number(employee_number)
            .is_some_and(|u| other(&u))
        {
            return Err(DomainError::conflict("employee number already exists").into());
        }
        Ok(())
    }

    // ─────────────────────────────────────────────────────────────────────
    // Session lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Check credentials, then issue and persist a session token.
    ///
    /// Unknown email, inactive account and wrong password all fail with the
    /// same [`INVALID_CREDENTIALS`] error.
    pub fn login(
        &self,
        email: &str,
        password: &str,
        now: DateTime<Utc>,
    ) -> Result<(User, String), AuthError> {
        let Some(user) = self.users.find_by_email(&normalize_email(email)) else {
            self.burn_verification(password);
            tracing::warn!("login rejected");
            return Err(AuthError::authentication(INVALID_CREDENTIALS));
        };

        let password_ok = self.credentials.verify(password, &user.password_hash);
        if !password_ok || !user.active {
            tracing::warn!(user_id = %user.id, "login rejected");
            return Err(AuthError::authentication(INVALID_CREDENTIALS));
        }

        let token = self
            .session
            .tokens()
            .issue(user.id, &user.employee_number, user.role, now)?;
        self.session.save(&token)?;

        tracing::info!(user_id = %user.id, role = %user.role, "login succeeded");
        Ok((user, token))
    }

    /// Spend the same hashing work on an unknown email as on a known one.
    fn burn_verification(&self, password: &str) {
        let dummy = self
            .dummy_hash
            .get_or_init(|| self.credentials.hash("epicevents-timing-pad").ok());
        if let Some(hash) = dummy {
            let _ = self.credentials.verify(password, hash);
        }
    }

    pub fn logout(&self) -> Result<(), AuthError> {
        self.session.clear()?;
        tracing::info!("logged out");
        Ok(())
    }

    /// Resolve the principal behind the persisted session.
    ///
    /// A missing or inactive user clears the slot (if it still holds the
    /// same token) before failing.
    pub fn resolve_current(&self, now: DateTime<Utc>) -> Result<User, AuthError> {
        let session = self.session.get_valid(now)?;

        let Ok(user_id) = session.claims.subject_id() else {
            self.session.clear_token(&session.token)?;
            return Err(AuthError::authentication(MSG_SESSION_INVALID));
        };

        match self.users.get(user_id) {
            Some(user) if user.active => Ok(user),
            _ => {
                self.session.clear_token(&session.token)?;
                tracing::warn!(user_id = %user_id, "session user missing or inactive; cleared");
                Err(AuthError::authentication(MSG_USER_GONE))
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Account changes
    // ─────────────────────────────────────────────────────────────────────

    pub fn change_password(
        &self,
        user: &User,
        old_password: &str,
        new_password: &str,
        now: DateTime<Utc>,
    ) -> Result<User, AuthError> {
        let mut updated = self
            .users
            .get(user.id)
            .ok_or_else(|| DomainError::not_found(format!("user {}", user.id)))?;
        if !self.credentials.verify(old_password, &updated.password_hash) {
            tracing::warn!(user_id = %user.id, "password change rejected");
            return Err(AuthError::authentication("current password is incorrect"));
        }

        updated.password_hash = self.credentials.hash(new_password)?;
        updated.updated_at = now;
        self.users.save(updated.clone());

        tracing::info!(user_id = %user.id, "password changed");
        Ok(updated)
    }

    /// Mark an account inactive.
    ///
    /// Tokens already issued stay signature-valid until they expire (at most
    /// 24h); [`Self::resolve_current`] rejects them at the inactive check.
    /// Revocation is therefore bounded by the token lifetime, not immediate.
    pub fn deactivate(&self, user_id: UserId, now: DateTime<Utc>) -> Result<User, AuthError> {
        let mut user = self
            .users
            .get(user_id)
            .ok_or_else(|| DomainError::not_found(format!("user {user_id}")))?;
        user.active = false;
        user.updated_at = now;
        self.users.save(user.clone());

        tracing::info!(user_id = %user_id, "user deactivated");
        Ok(user)
    }

    pub fn deactivate_principal(
        &self,
        actor: &Principal,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<User, AuthError> {
        require_role(actor, &[Role::Management])?;
        self.deactivate(user_id, now)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Administration (management only)
    // ─────────────────────────────────────────────────────────────────────

    pub fn create_principal(
        &self,
        actor: &Principal,
        new: NewUser,
        now: DateTime<Utc>,
    ) -> Result<User, AuthError> {
        require_role(actor, &[Role::Management])?;
        new.validate()?;
        let user = self.register(new, now)?;

        tracing::info!(actor = %actor.id, user_id = %user.id, "collaborator created");
        Ok(user)
    }

    pub fn update_principal(
        &self,
        actor: &Principal,
        user_id: UserId,
        update: UserUpdate,
        now: DateTime<Utc>,
    ) -> Result<User, AuthError> {
        require_role(actor, &[Role::Management])?;
        update.validate()?;

        let mut user = self
            .users
            .get(user_id)
            .ok_or_else(|| DomainError::not_found(format!("user {user_id}")))?;
        if update.is_empty() {
            return Ok(user);
        }

        let email = update
            .email
            .as_deref()
            .map(normalize_email)
            .unwrap_or_else(|| user.email.clone());
        let employee_number = update
            .employee_number
            .as_deref()
            .map(normalize_employee_number)
            .unwrap_or_else(|| user.employee_number.clone());
        self.ensure_unique(&email, &employee_number, Some(user_id))?;

        update.apply_to(&mut user, now);
        self.users.save(user.clone());

        tracing::info!(actor = %actor.id, user_id = %user_id, "collaborator updated");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directory::InMemoryUserDirectory;
    use crate::session::InMemorySessionStore;
    use chrono::Duration;

    type Service = AuthService<InMemoryUserDirectory, InMemorySessionStore>;

    fn service() -> Service {
        AuthService::with_hash_params(
            InMemoryUserDirectory::new(),
            InMemorySessionStore::new(),
            &AuthConfig::new("service-test-secret", "."),
            HashParams::MINIMAL,
        )
    }

    fn new_user(n: &str, email: &str, role: Role) -> NewUser {
        NewUser {
            employee_number: n.to_string(),
            full_name: format!("User {n}"),
            email: email.to_string(),
            password: "pw123456".to_string(),
            role,
        }
    }

    fn manager(svc: &Service) -> Principal {
        svc.register(new_user("MGR1", "boss@x.com", Role::Management), Utc::now())
            .unwrap()
            .principal()
    }

    #[test]
    fn register_lowercases_email_and_hashes_password() {
        let svc = service();
        let user = svc
            .register(new_user("EMP001", "A@X.com", Role::Sales), Utc::now())
            .unwrap();

        assert_eq!(user.email, "a@x.com");
        assert!(user.active);
        assert_ne!(user.password_hash, "pw123456");
        assert_eq!(svc.users().get(user.id), Some(user));
    }

    #[test]
    fn register_rejects_duplicates_case_insensitively() {
        let svc = service();
        svc.register(new_user("EMP001", "a@x.com", Role::Sales), Utc::now())
            .unwrap();

        let dup_email = svc.register(new_user("EMP002", "A@X.COM", Role::Sales), Utc::now());
        assert!(matches!(dup_email, Err(AuthError::Domain(DomainError::Conflict(_)))));

        let dup_number = svc.register(new_user("EMP001", "b@x.com", Role::Sales), Utc::now());
        assert!(matches!(dup_number, Err(AuthError::Domain(DomainError::Conflict(_)))));
    }

    #[test]
    fn register_does_not_enforce_password_strength() {
        let svc = service();
        let mut short = new_user("EMP001", "a@x.com", Role::Support);
        short.password = "pw".to_string();
        assert!(svc.register(short, Utc::now()).is_ok());
    }

    #[test]
    fn login_persists_token_and_resolves_current() {
        let svc = service();
        let user = svc
            .register(new_user("EMP001", "a@x.com", Role::Sales), Utc::now())
            .unwrap();
        let now = Utc::now();

        let (logged_in, token) = svc.login("A@x.com", "pw123456", now).unwrap();
        assert_eq!(logged_in.id, user.id);
        assert!(!token.is_empty());
        assert_eq!(svc.session().load().unwrap(), Some(token));

        assert_eq!(svc.resolve_current(now).unwrap().id, user.id);
    }

    #[test]
    fn login_failures_are_indistinguishable() {
        let svc = service();
        let user = svc
            .register(new_user("EMP001", "a@x.com", Role::Sales), Utc::now())
            .unwrap();
        let now = Utc::now();

        let wrong_password = svc.login("a@x.com", "wrong", now).unwrap_err();
        let unknown = svc.login("nobody@x.com", "pw123456", now).unwrap_err();
        svc.deactivate(user.id, now).unwrap();
        let inactive = svc.login("a@x.com", "pw123456", now).unwrap_err();

        assert!(wrong_password.is_authentication());
        assert_eq!(wrong_password, unknown);
        assert_eq!(wrong_password, inactive);
        assert_eq!(svc.session().load().unwrap(), None);
    }

    #[test]
    fn second_login_overwrites_first_session() {
        let svc = service();
        svc.register(new_user("EMP001", "a@x.com", Role::Sales), Utc::now())
            .unwrap();
        let b = svc
            .register(new_user("EMP002", "b@x.com", Role::Support), Utc::now())
            .unwrap();
        let now = Utc::now();

        svc.login("a@x.com", "pw123456", now).unwrap();
        let (_, token_b) = svc.login("b@x.com", "pw123456", now).unwrap();

        assert_eq!(svc.session().load().unwrap(), Some(token_b));
        assert_eq!(svc.resolve_current(now).unwrap().id, b.id);
    }

    #[test]
    fn resolve_current_distinguishes_session_states() {
        let svc = service();
        svc.register(new_user("EMP001", "a@x.com", Role::Sales), Utc::now())
            .unwrap();
        let now = Utc::now();

        let none = svc.resolve_current(now).unwrap_err();
        assert_eq!(none, AuthError::authentication(crate::error::MSG_NO_SESSION));

        svc.login("a@x.com", "pw123456", now).unwrap();
        let expired = svc.resolve_current(now + Duration::hours(25)).unwrap_err();
        assert_eq!(expired, AuthError::authentication(crate::error::MSG_SESSION_EXPIRED));
        assert_eq!(svc.session().load().unwrap(), None);

        svc.session().save("garbage").unwrap();
        let invalid = svc.resolve_current(now).unwrap_err();
        assert_eq!(invalid, AuthError::authentication(MSG_SESSION_INVALID));
        assert_eq!(svc.session().load().unwrap(), None);
    }

    #[test]
    fn deactivation_rejects_live_token_and_clears_slot() {
        let svc = service();
        let user = svc
            .register(new_user("EMP001", "a@x.com", Role::Sales), Utc::now())
            .unwrap();
        let now = Utc::now();
        let (_, token) = svc.login("a@x.com", "pw123456", now).unwrap();

        svc.deactivate(user.id, now).unwrap();

        assert!(!svc.session().tokens().is_expired(&token, now));
        let err = svc.resolve_current(now).unwrap_err();
        assert_eq!(err, AuthError::authentication(MSG_USER_GONE));
        assert_eq!(svc.session().load().unwrap(), None);
    }

    #[test]
    fn logout_empties_slot() {
        let svc = service();
        svc.register(new_user("EMP001", "a@x.com", Role::Sales), Utc::now())
            .unwrap();
        svc.login("a@x.com", "pw123456", Utc::now()).unwrap();

        svc.logout().unwrap();
        svc.logout().unwrap();
        assert_eq!(svc.session().load().unwrap(), None);
    }

    #[test]
    fn change_password_requires_old_password() {
        let svc = service();
        let user = svc
            .register(new_user("EMP001", "a@x.com", Role::Sales), Utc::now())
            .unwrap();
        let now = Utc::now();

        let err = svc.change_password(&user, "nope", "newpass99", now).unwrap_err();
        assert!(err.is_authentication());

        svc.change_password(&user, "pw123456", "newpass99", now).unwrap();
        assert!(svc.login("a@x.com", "pw123456", now).is_err());
        assert!(svc.login("a@x.com", "newpass99", now).is_ok());
    }

    #[test]
    fn change_password_checks_stored_hash_not_caller_copy() {
        let svc = service();
        let stale = svc
            .register(new_user("EMP001", "a@x.com", Role::Sales), Utc::now())
            .unwrap();
        let now = Utc::now();

        svc.change_password(&stale, "pw123456", "rotated22", now).unwrap();

        let err = svc
            .change_password(&stale, "pw123456", "attacker3", now)
            .unwrap_err();
        assert!(err.is_authentication());
        assert!(svc.login("a@x.com", "attacker3", now).is_err());
        assert!(svc.login("a@x.com", "rotated22", now).is_ok());
    }

    #[test]
    fn change_password_for_unknown_user_is_not_found() {
        let svc = service();
        let mut ghost = svc
            .register(new_user("EMP001", "a@x.com", Role::Sales), Utc::now())
            .unwrap();
        ghost.id = UserId::new();

        let err = svc
            .change_password(&ghost, "pw123456", "newpass99", Utc::now())
            .unwrap_err();
        assert!(matches!(err, AuthError::Domain(DomainError::NotFound(_))));
    }

    #[test]
    fn admin_operations_require_management_role() {
        let svc = service();
        let sales = svc
            .register(new_user("EMP001", "a@x.com", Role::Sales), Utc::now())
            .unwrap()
            .principal();

        let err = svc
            .create_principal(&sales, new_user("EMP002", "b@x.com", Role::Support), Utc::now())
            .unwrap_err();
        assert!(err.is_permission_denied());

        let err = svc
            .update_principal(&sales, sales.id, UserUpdate::default(), Utc::now())
            .unwrap_err();
        assert!(err.is_permission_denied());

        let err = svc
            .deactivate_principal(&sales, sales.id, Utc::now())
            .unwrap_err();
        assert!(err.is_permission_denied());
    }

    #[test]
    fn create_principal_validates_fields() {
        let svc = service();
        let boss = manager(&svc);

        let mut weak = new_user("EMP002", "b@x.com", Role::Support);
        weak.password = "1234567".to_string();
        let err = svc.create_principal(&boss, weak, Utc::now()).unwrap_err();
        assert!(matches!(err, AuthError::Domain(DomainError::Validation(_))));

        let bad_email = new_user("EMP002", "no-at-sign", Role::Support);
        assert!(svc.create_principal(&boss, bad_email, Utc::now()).is_err());

        let created = svc
            .create_principal(&boss, new_user("EMP002", "B@x.com", Role::Support), Utc::now())
            .unwrap();
        assert_eq!(created.email, "b@x.com");
    }

    #[test]
    fn update_principal_uniqueness_excludes_self() {
        let svc = service();
        let boss = manager(&svc);
        let a = svc
            .register(new_user("EMP001", "a@x.com", Role::Sales), Utc::now())
            .unwrap();
        svc.register(new_user("EMP002", "b@x.com", Role::Sales), Utc::now())
            .unwrap();

        let same_email = UserUpdate {
            email: Some("A@X.com".to_string()),
            full_name: Some("Alice Renamed".to_string()),
            ..Default::default()
        };
        let updated = svc
            .update_principal(&boss, a.id, same_email, Utc::now())
            .unwrap();
        assert_eq!(updated.full_name, "Alice Renamed");
        assert_eq!(updated.email, "a@x.com");

        let taken = UserUpdate {
            email: Some("b@x.com".to_string()),
            ..Default::default()
        };
        let err = svc.update_principal(&boss, a.id, taken, Utc::now()).unwrap_err();
        assert!(matches!(err, AuthError::Domain(DomainError::Conflict(_))));

        let missing = svc
            .update_principal(&boss, UserId::new(), UserUpdate::default(), Utc::now())
            .unwrap_err();
        assert!(matches!(missing, AuthError::Domain(DomainError::NotFound(_))));
    }
}
