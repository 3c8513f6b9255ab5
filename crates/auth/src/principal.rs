use serde::{Deserialize, Serialize};

use epicevents_core::UserId;

use crate::Role;

/// The acting identity behind an authorization decision.
///
/// Built from a loaded, active [`crate::User`]; carries only what the
/// permission model and ownership predicates look at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: UserId,
    pub employee_number: String,
    pub role: Role,
}

impl Principal {
    pub fn new(id: UserId, employee_number: impl Into<String>, role: Role) -> Self {
        Self {
            id,
            employee_number: employee_number.into(),
            role,
        }
    }

    pub fn is(&self, role: Role) -> bool {
        self.role == role
    }
}

impl core::fmt::Display for Principal {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{} ({})", self.employee_number, self.role)
    }
}
