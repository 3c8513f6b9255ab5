use std::borrow::Cow;

use serde::{Deserialize, Serialize};

const OWN_SUFFIX: &str = "_own";

/// Capability identifier.
///
/// Capabilities are `"<resource>.<action>"` strings (e.g. "client.create").
/// An `_own` suffix marks an ownership-scoped grant that only holds when the
/// acting principal owns the target record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(Cow<'static, str>);

impl Capability {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_ownership_scoped(&self) -> bool {
        self.as_str().ends_with(OWN_SUFFIX)
    }

    /// The `_own` form of this capability (`contract.update` -> `contract.update_own`).
    pub fn owned_variant(&self) -> Capability {
        if self.is_ownership_scoped() {
            self.clone()
        } else {
            Capability::new(format!("{}{}", self.as_str(), OWN_SUFFIX))
        }
    }

    /// The plain form of this capability (`event.update_own` -> `event.update`).
    pub fn base(&self) -> Capability {
        match self.as_str().strip_suffix(OWN_SUFFIX) {
            Some(base) => Capability::new(base.to_string()),
            None => self.clone(),
        }
    }

    pub fn resource(&self) -> &str {
        self.as_str().split('.').next().unwrap_or_default()
    }
}

impl core::fmt::Display for Capability {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Every capability named by the role table.
pub mod caps {
    use super::Capability;

    pub const USER_CREATE: Capability = Capability::from_static("user.create");
    pub const USER_READ: Capability = Capability::from_static("user.read");
    pub const USER_UPDATE: Capability = Capability::from_static("user.update");
    pub const USER_DELETE: Capability = Capability::from_static("user.delete");

    pub const CLIENT_CREATE: Capability = Capability::from_static("client.create");
    pub const CLIENT_READ: Capability = Capability::from_static("client.read");
    pub const CLIENT_UPDATE: Capability = Capability::from_static("client.update");
    pub const CLIENT_UPDATE_OWN: Capability = Capability::from_static("client.update_own");

    pub const CONTRACT_CREATE: Capability = Capability::from_static("contract.create");
    pub const CONTRACT_READ: Capability = Capability::from_static("contract.read");
    pub const CONTRACT_UPDATE: Capability = Capability::from_static("contract.update");
    pub const CONTRACT_UPDATE_OWN: Capability = Capability::from_static("contract.update_own");

    pub const EVENT_CREATE: Capability = Capability::from_static("event.create");
    pub const EVENT_READ: Capability = Capability::from_static("event.read");
    pub const EVENT_UPDATE: Capability = Capability::from_static("event.update");
    pub const EVENT_UPDATE_OWN: Capability = Capability::from_static("event.update_own");
}
