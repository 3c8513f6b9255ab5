//! Collaborator records and their field rules.
//!
//! Emails are lowercased (and trimmed) at creation and on every update so
//! uniqueness checks are case-insensitive.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use epicevents_core::{DomainError, DomainResult, Entity, UserId};

use crate::{Principal, Role};

/// Minimum password length accepted by the administrative creation path.
pub const MIN_PASSWORD_LEN: usize = 8;

/// A collaborator account.
///
/// Never physically deleted: deactivation is the terminal state for login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub employee_number: String,
    pub full_name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal::new(self.id, self.employee_number.clone(), self.role)
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

/// Input for registration and administrative creation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewUser {
    pub employee_number: String,
    pub full_name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Partial update applied by the administrative update path.
///
/// `None` keeps the existing value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct UserUpdate {
    pub employee_number: Option<String>,
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub role: Option<Role>,
    pub active: Option<bool>,
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub fn normalize_employee_number(employee_number: &str) -> String {
    employee_number.trim().to_string()
}

pub(crate) fn validate_employee_number(employee_number: &str) -> DomainResult<()> {
    if employee_number.trim().is_empty() {
        return Err(DomainError::validation("employee number cannot be empty"));
    }
    Ok(())
}

pub(crate) fn validate_full_name(full_name: &str) -> DomainResult<()> {
    if full_name.trim().is_empty() {
        return Err(DomainError::validation("full name cannot be empty"));
    }
    Ok(())
}

pub(crate) fn validate_email(email: &str) -> DomainResult<()> {
    if email.trim().is_empty() || !email.contains('@') {
        return Err(DomainError::validation("invalid email format"));
    }
    Ok(())
}

pub(crate) fn validate_password(password: &str) -> DomainResult<()> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}

impl NewUser {
    /// Field rules of the administrative creation path.
    pub fn validate(&self) -> DomainResult<()> {
        validate_employee_number(&self.employee_number)?;
        validate_full_name(&self.full_name)?;
        validate_email(&self.email)?;
        validate_password(&self.password)
    }
}

impl UserUpdate {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(n) = &self.employee_number {
            validate_employee_number(n)?;
        }
        if let Some(name) = &self.full_name {
            validate_full_name(name)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.employee_number.is_none()
            && self.full_name.is_none()
            && self.email.is_none()
            && self.role.is_none()
            && self.active.is_none()
    }

    /// Apply the (already validated) changes, normalizing as on creation.
    pub fn apply_to(&self, user: &mut User, now: DateTime<Utc>) {
        if let Some(n) = &self.employee_number {
            user.employee_number = normalize_employee_number(n);
        }
        if let Some(name) = &self.full_name {
            user.full_name = name.trim().to_string();
        }
        if let Some(email) = &self.email {
            user.email = normalize_email(email);
        }
        if let Some(role) = self.role {
            user.role = role;
        }
        if let Some(active) = self.active {
            user.active = active;
        }
        user.updated_at = now;
    }
}
