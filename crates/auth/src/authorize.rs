//! Authorization gate.
//!
//! Every business operation calls [`authorize`] or [`authorize_owned`] before
//! touching data.
//!
//! - No IO
//! - No panics
//! - Denials are returned, never swallowed

use thiserror::Error;

use crate::{Capability, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("permission denied: '{capability}' required, role '{role}' does not allow this action")]
    PermissionDenied { capability: String, role: Role },

    #[error("access denied: allowed roles are {allowed}, your role is '{role}'")]
    RoleRequired { allowed: String, role: Role },
}

/// Why an ownership-scoped check was granted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    /// The role holds the plain capability.
    Blanket,
    /// The role holds the `_own` capability and the principal owns the record.
    Ownership,
}

fn denied(principal: &Principal, capability: &Capability) -> AuthzError {
    tracing::warn!(
        user_id = %principal.id,
        role = %principal.role,
        capability = %capability,
        "permission denied"
    );
    AuthzError::PermissionDenied {
        capability: capability.as_str().to_string(),
        role: principal.role,
    }
}

/// Require a capability from the static role table.
pub fn authorize(principal: &Principal, capability: &Capability) -> Result<(), AuthzError> {
    if principal.role.has_capability(capability) {
        Ok(())
    } else {
        Err(denied(principal, capability))
    }
}

/// Require the plain or the `_own` form of a capability, before any record is
/// loaded. A role holding neither is denied without learning whether the
/// target exists.
pub fn authorize_any_scope(
    principal: &Principal,
    capability: &Capability,
) -> Result<(), AuthzError> {
    let base = capability.base();
    if principal.role.has_capability(&base) || principal.role.has_capability(&base.owned_variant())
    {
        Ok(())
    } else {
        Err(denied(principal, &base))
    }
}

/// Require a capability, accepting its `_own` form when `owns` holds.
///
/// The plain capability always wins; the `_own` capability needs the
/// ownership predicate. `capability` may be given in either form.
pub fn authorize_owned<E, F>(
    principal: &Principal,
    capability: &Capability,
    entity: &E,
    owns: F,
) -> Result<Grant, AuthzError>
where
    E: ?Sized,
    F: Fn(&Principal, &E) -> bool,
{
    let base = capability.base();
    if principal.role.has_capability(&base) {
        return Ok(Grant::Blanket);
    }
    if principal.role.has_capability(&base.owned_variant()) && owns(principal, entity) {
        return Ok(Grant::Ownership);
    }
    Err(denied(principal, &base))
}

/// Hard role check, independent of the capability table.
pub fn require_role(principal: &Principal, allowed: &[Role]) -> Result<(), AuthzError> {
    if allowed.contains(&principal.role) {
        return Ok(());
    }
    tracing::warn!(user_id = %principal.id, role = %principal.role, "role check failed");
    Err(AuthzError::RoleRequired {
        allowed: allowed
            .iter()
            .map(|r| r.as_str())
            .collect::<Vec<_>>()
            .join(", "),
        role: principal.role,
    })
}
