//! `epicevents-crm`: clients, contracts and events behind the authorization gate.

pub mod client;
pub mod contract;
pub mod event;
pub mod service;

pub use client::{Client, ClientUpdate, NewClient};
pub use contract::{Contract, ContractUpdate, ContractView, NewContract};
pub use event::{Event, EventUpdate, NewEvent};
pub use service::CrmService;
