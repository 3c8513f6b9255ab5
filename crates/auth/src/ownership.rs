//! Ownership predicates.
//!
//! Pure functions over a principal and an already-loaded record; no IO. The
//! record types live in the business layer and expose their owner links
//! through the traits below.

use epicevents_core::UserId;

use crate::{Principal, Role};

/// A record with a designated salesperson (a client).
pub trait SalesOwned {
    fn sales_contact_id(&self) -> Option<UserId>;
}

/// A record attached to a client (a contract). The client may be missing.
pub trait ClientLinked {
    type Client: SalesOwned;

    fn client(&self) -> Option<&Self::Client>;
}

/// A record with an assigned support collaborator (an event).
pub trait SupportAssigned {
    fn support_contact_id(&self) -> Option<UserId>;
}

pub fn owns_client<C: SalesOwned + ?Sized>(principal: &Principal, client: &C) -> bool {
    client.sales_contact_id() == Some(principal.id)
}

/// A contract is owned through its client; an orphaned contract has no owner.
pub fn owns_contract<K: ClientLinked + ?Sized>(principal: &Principal, contract: &K) -> bool {
    contract
        .client()
        .is_some_and(|client| owns_client(principal, client))
}

pub fn owns_event<E: SupportAssigned + ?Sized>(principal: &Principal, event: &E) -> bool {
    event.support_contact_id() == Some(principal.id)
}

/// Only the owning salesperson may modify a client.
pub fn can_modify_client<C: SalesOwned + ?Sized>(principal: &Principal, client: &C) -> bool {
    principal.role == Role::Sales && owns_client(principal, client)
}

pub fn can_modify_contract<K: ClientLinked + ?Sized>(principal: &Principal, contract: &K) -> bool {
    match principal.role {
        Role::Management => true,
        Role::Sales => owns_contract(principal, contract),
        Role::Support => false,
    }
}

pub fn can_modify_event<E: SupportAssigned + ?Sized>(principal: &Principal, event: &E) -> bool {
    match principal.role {
        Role::Management => true,
        Role::Support => owns_event(principal, event),
        Role::Sales => false,
    }
}
