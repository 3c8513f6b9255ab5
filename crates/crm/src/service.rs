//! Business operations over clients, contracts and events.
//!
//! Every operation takes the authenticated principal and goes through the
//! authorization gate before reading or writing a record.

use chrono::{DateTime, Utc};

use epicevents_auth::ownership::{owns_client, owns_contract, owns_event};
use epicevents_auth::{
    Principal, Role, UserDirectory, authorize, authorize_any_scope, authorize_owned, caps,
};
use epicevents_core::{
    ClientId, ContractId, DomainError, DomainResult, EventId, InMemoryRecordStore, RecordStore,
    UserId,
};

use crate::client::{Client, ClientUpdate, NewClient};
use crate::contract::{Contract, ContractUpdate, ContractView, NewContract};
use crate::event::{Event, EventUpdate, NewEvent};

pub type ClientStore = Box<dyn RecordStore<ClientId, Client>>;
pub type ContractStore = Box<dyn RecordStore<ContractId, Contract>>;
pub type EventStore = Box<dyn RecordStore<EventId, Event>>;

pub struct CrmService<U> {
    users: U,
    clients: ClientStore,
    contracts: ContractStore,
    events: EventStore,
}

fn not_owner(actor: &Principal, what: &str) -> DomainError {
    tracing::warn!(user_id = %actor.id, role = %actor.role, "{what} not owned by caller");
    DomainError::permission_denied(format!("{what} is not assigned to you"))
}

impl<U: UserDirectory> CrmService<U> {
    /// Service backed by in-memory stores.
    pub fn new(users: U) -> Self {
        Self::with_stores(
            users,
            Box::new(InMemoryRecordStore::new()),
            Box::new(InMemoryRecordStore::new()),
            Box::new(InMemoryRecordStore::new()),
        )
    }

    pub fn with_stores(
        users: U,
        clients: ClientStore,
        contracts: ContractStore,
        events: EventStore,
    ) -> Self {
        Self {
            users,
            clients,
            contracts,
            events,
        }
    }

    pub fn users(&self) -> &U {
        &self.users
    }

    // ─────────────────────────────────────────────────────────────────────
    // Clients
    // ─────────────────────────────────────────────────────────────────────

    fn load_client(&self, id: ClientId) -> DomainResult<Client> {
        self.clients
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("client {id}")))
    }

    fn ensure_client_email_free(&self, email: &str, exclude: Option<ClientId>) -> DomainResult<()> {
        let email = email.trim().to_lowercase();
        let taken = self
            .clients
            .find(&|c: &Client| c.email == email && Some(c.id) != exclude);
        match taken {
            Some(_) => Err(DomainError::conflict("a client with this email already exists")),
            None => Ok(()),
        }
    }

    /// Create a client; the caller becomes its sales contact.
    pub fn create_client(
        &self,
        actor: &Principal,
        new: NewClient,
        now: DateTime<Utc>,
    ) -> DomainResult<Client> {
        authorize(actor, &caps::CLIENT_CREATE)?;
        new.validate()?;
        self.ensure_client_email_free(&new.email, None)?;

        let client = new.into_client(actor.id, now);
        self.clients.save(client.clone());

        tracing::info!(user_id = %actor.id, client_id = %client.id, "client created");
        Ok(client)
    }

    pub fn update_client(
        &self,
        actor: &Principal,
        id: ClientId,
        update: ClientUpdate,
        now: DateTime<Utc>,
    ) -> DomainResult<Client> {
        authorize_any_scope(actor, &caps::CLIENT_UPDATE)?;
        let mut client = self.load_client(id)?;
        authorize_owned(actor, &caps::CLIENT_UPDATE, &client, owns_client)?;
        update.validate()?;
        if let Some(email) = &update.email {
            self.ensure_client_email_free(email, Some(id))?;
        }

        update.apply_to(&mut client, now);
        self.clients.save(client.clone());

        tracing::info!(user_id = %actor.id, client_id = %id, "client updated");
        Ok(client)
    }

    pub fn get_client(&self, actor: &Principal, id: ClientId) -> DomainResult<Client> {
        authorize(actor, &caps::CLIENT_READ)?;
        self.load_client(id)
    }

    pub fn list_clients(&self, actor: &Principal) -> DomainResult<Vec<Client>> {
        authorize(actor, &caps::CLIENT_READ)?;
        Ok(self.clients.list())
    }

    pub fn list_my_clients(&self, actor: &Principal) -> DomainResult<Vec<Client>> {
        authorize(actor, &caps::CLIENT_READ)?;
        Ok(self
            .clients
            .filter(&|c: &Client| c.sales_contact_id == Some(actor.id)))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Contracts
    // ─────────────────────────────────────────────────────────────────────

    /// Load a contract with its client snapshot (absent if the client is gone).
    pub fn contract_view(&self, id: ContractId) -> DomainResult<ContractView> {
        let contract = self
            .contracts
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("contract {id}")))?;
        let client = contract.client_id.and_then(|cid| self.clients.get(&cid));
        Ok(ContractView { contract, client })
    }

    /// Sales may only draw up contracts for their own clients.
    pub fn create_contract(
        &self,
        actor: &Principal,
        new: NewContract,
        now: DateTime<Utc>,
    ) -> DomainResult<Contract> {
        authorize(actor, &caps::CONTRACT_CREATE)?;
        let client = self.load_client(new.client_id)?;
        if !owns_client(actor, &client) {
            return Err(not_owner(actor, "client"));
        }
        new.validate()?;

        let contract = new.into_contract(now);
        self.contracts.save(contract.clone());

        tracing::info!(
            user_id = %actor.id,
            contract_id = %contract.id,
            client_id = %client.id,
            "contract created"
        );
        Ok(contract)
    }

    pub fn update_contract(
        &self,
        actor: &Principal,
        id: ContractId,
        update: ContractUpdate,
    ) -> DomainResult<Contract> {
        authorize_any_scope(actor, &caps::CONTRACT_UPDATE)?;
        let view = self.contract_view(id)?;
        authorize_owned(actor, &caps::CONTRACT_UPDATE, &view, owns_contract)?;
        update.validate_against(&view.contract)?;

        let mut contract = view.contract;
        update.apply_to(&mut contract);
        self.contracts.save(contract.clone());

        tracing::info!(user_id = %actor.id, contract_id = %id, "contract updated");
        Ok(contract)
    }

    pub fn list_contracts(&self, actor: &Principal) -> DomainResult<Vec<Contract>> {
        authorize(actor, &caps::CONTRACT_READ)?;
        Ok(self.contracts.list())
    }

    pub fn list_unsigned_contracts(&self, actor: &Principal) -> DomainResult<Vec<Contract>> {
        authorize(actor, &caps::CONTRACT_READ)?;
        Ok(self.contracts.filter(&|c: &Contract| !c.is_signed))
    }

    pub fn list_unpaid_contracts(&self, actor: &Principal) -> DomainResult<Vec<Contract>> {
        authorize(actor, &caps::CONTRACT_READ)?;
        Ok(self.contracts.filter(&|c: &Contract| !c.is_paid()))
    }

    // ─────────────────────────────────────────────────────────────────────
    // Events
    // ─────────────────────────────────────────────────────────────────────

    fn load_event(&self, id: EventId) -> DomainResult<Event> {
        self.events
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("event {id}")))
    }

    /// Events hang off a signed contract of one of the caller's clients.
    pub fn create_event(&self, actor: &Principal, new: NewEvent) -> DomainResult<Event> {
        authorize(actor, &caps::EVENT_CREATE)?;
        let view = self.contract_view(new.contract_id)?;
        if !owns_contract(actor, &view) {
            return Err(not_owner(actor, "contract"));
        }
        if !view.contract.is_signed {
            return Err(DomainError::validation(
                "an event can only be created for a signed contract",
            ));
        }
        new.validate()?;

        let event = new.into_event();
        self.events.save(event.clone());

        tracing::info!(user_id = %actor.id, event_id = %event.id, "event created");
        Ok(event)
    }

    pub fn update_event(
        &self,
        actor: &Principal,
        id: EventId,
        update: EventUpdate,
    ) -> DomainResult<Event> {
        authorize_any_scope(actor, &caps::EVENT_UPDATE)?;
        let mut event = self.load_event(id)?;
        authorize_owned(actor, &caps::EVENT_UPDATE, &event, owns_event)?;
        update.validate_against(&event)?;

        update.apply_to(&mut event);
        self.events.save(event.clone());

        tracing::info!(user_id = %actor.id, event_id = %id, "event updated");
        Ok(event)
    }

    /// Assign (or reassign) the support collaborator of an event.
    pub fn assign_support(
        &self,
        actor: &Principal,
        id: EventId,
        support_id: UserId,
    ) -> DomainResult<Event> {
        authorize(actor, &caps::EVENT_UPDATE)?;
        let mut event = self.load_event(id)?;

        let assignee = self
            .users
            .get(support_id)
            .ok_or_else(|| DomainError::not_found(format!("user {support_id}")))?;
        if assignee.role != Role::Support || !assignee.active {
            return Err(DomainError::validation(
                "events can only be assigned to an active support collaborator",
            ));
        }

        event.support_contact_id = Some(support_id);
        self.events.save(event.clone());

        tracing::info!(
            user_id = %actor.id,
            event_id = %id,
            support_id = %support_id,
            "support assigned"
        );
        Ok(event)
    }

    pub fn list_events(&self, actor: &Principal) -> DomainResult<Vec<Event>> {
        authorize(actor, &caps::EVENT_READ)?;
        Ok(self.events.list())
    }

    pub fn list_my_events(&self, actor: &Principal) -> DomainResult<Vec<Event>> {
        authorize(actor, &caps::EVENT_READ)?;
        Ok(self
            .events
            .filter(&|e: &Event| e.support_contact_id == Some(actor.id)))
    }

    pub fn list_unassigned_events(&self, actor: &Principal) -> DomainResult<Vec<Event>> {
        authorize(actor, &caps::EVENT_READ)?;
        Ok(self
            .events
            .filter(&|e: &Event| e.support_contact_id.is_none()))
    }
}
