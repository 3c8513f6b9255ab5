//! `epicevents-core`: shared domain building blocks.
//!
//! Identifiers, the error taxonomy every layer reports through, and the keyed
//! record store the business layers read entities from. No IO beyond memory.

pub mod entity;
pub mod error;
pub mod id;
pub mod store;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{ClientId, ContractId, EventId, UserId};
pub use store::{InMemoryRecordStore, RecordStore};
