use core::str::FromStr;

use serde::{Deserialize, Serialize};

use epicevents_core::DomainError;

use crate::permissions::{Capability, caps};

const MANAGEMENT_CAPABILITIES: &[Capability] = &[
    caps::USER_CREATE,
    caps::USER_READ,
    caps::USER_UPDATE,
    caps::USER_DELETE,
    caps::CLIENT_READ,
    caps::CONTRACT_READ,
    caps::CONTRACT_UPDATE,
    caps::EVENT_READ,
    caps::EVENT_UPDATE,
];

const SALES_CAPABILITIES: &[Capability] = &[
    caps::CLIENT_CREATE,
    caps::CLIENT_READ,
    caps::CLIENT_UPDATE_OWN,
    caps::CONTRACT_CREATE,
    caps::CONTRACT_READ,
    caps::CONTRACT_UPDATE_OWN,
    caps::EVENT_CREATE,
    caps::EVENT_READ,
];

const SUPPORT_CAPABILITIES: &[Capability] = &[
    caps::CLIENT_READ,
    caps::CONTRACT_READ,
    caps::EVENT_READ,
    caps::EVENT_UPDATE_OWN,
];

/// Collaborator role.
///
/// Closed set: adding a variant forces every exhaustive `match` over roles
/// (the capability table included) to be revisited.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Management,
    Sales,
    Support,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Management, Role::Sales, Role::Support];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Management => "management",
            Role::Sales => "sales",
            Role::Support => "support",
        }
    }

    /// Static allow-list of capabilities granted to this role.
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Role::Management => MANAGEMENT_CAPABILITIES,
            Role::Sales => SALES_CAPABILITIES,
            Role::Support => SUPPORT_CAPABILITIES,
        }
    }

    pub fn has_capability(&self, capability: &Capability) -> bool {
        has_capability(*self, capability.as_str())
    }
}

/// Pure set-membership check against the static role table.
pub fn has_capability(role: Role, capability: &str) -> bool {
    role.capabilities().iter().any(|c| c.as_str() == capability)
}

/// Capability names held by `role`, in table order.
pub fn capabilities_of(role: Role) -> Vec<&'static str> {
    role.capabilities().iter().map(Capability::as_str).collect()
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "management" => Ok(Role::Management),
            "sales" => Ok(Role::Sales),
            "support" => Ok(Role::Support),
            other => Err(DomainError::validation(format!(
                "unknown role '{other}' (expected management, sales or support)"
            ))),
        }
    }
}
