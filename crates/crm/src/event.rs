use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use epicevents_auth::SupportAssigned;
use epicevents_core::{ContractId, DomainError, DomainResult, Entity, EventId, UserId};

/// An event organized under a signed contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub contract_id: ContractId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: String,
    pub attendees: u32,
    pub notes: Option<String>,
    pub support_contact_id: Option<UserId>,
}

impl Entity for Event {
    type Id = EventId;

    fn id(&self) -> EventId {
        self.id
    }
}

impl SupportAssigned for Event {
    fn support_contact_id(&self) -> Option<UserId> {
        self.support_contact_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewEvent {
    pub contract_id: ContractId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub location: String,
    pub attendees: u32,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EventUpdate {
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub attendees: Option<u32>,
    pub notes: Option<String>,
}

/// End must be strictly after start.
fn validate_schedule(start: DateTime<Utc>, end: DateTime<Utc>) -> DomainResult<()> {
    if end <= start {
        return Err(DomainError::validation("event end must be after its start"));
    }
    Ok(())
}

fn validate_location(location: &str) -> DomainResult<()> {
    if location.trim().is_empty() {
        return Err(DomainError::validation("event location cannot be empty"));
    }
    Ok(())
}

impl NewEvent {
    pub fn validate(&self) -> DomainResult<()> {
        validate_schedule(self.start, self.end)?;
        validate_location(&self.location)
    }

    /// New events start without a support contact.
    pub fn into_event(self) -> Event {
        Event {
            id: EventId::new(),
            contract_id: self.contract_id,
            start: self.start,
            end: self.end,
            location: self.location.trim().to_string(),
            attendees: self.attendees,
            notes: self.notes,
            support_contact_id: None,
        }
    }
}

impl EventUpdate {
    pub fn validate_against(&self, current: &Event) -> DomainResult<()> {
        validate_schedule(
            self.start.unwrap_or(current.start),
            self.end.unwrap_or(current.end),
        )?;
        if let Some(location) = &self.location {
            validate_location(location)?;
        }
        Ok(())
    }

    pub fn apply_to(&self, event: &mut Event) {
        if let Some(start) = self.start {
            event.start = start;
        }
        if let Some(end) = self.end {
            event.end = end;
        }
        if let Some(location) = &self.location {
            event.location = location.trim().to_string();
        }
        if let Some(attendees) = self.attendees {
            event.attendees = attendees;
        }
        if self.notes.is_some() {
            event.notes = self.notes.clone();
        }
    }
}
