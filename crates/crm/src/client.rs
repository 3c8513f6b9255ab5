use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use epicevents_auth::SalesOwned;
use epicevents_core::{ClientId, DomainError, DomainResult, Entity, UserId};

/// A customer company contact, owned by one salesperson.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Client {
    pub id: ClientId,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
    /// Salesperson in charge; `None` once they left the company.
    pub sales_contact_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
    pub last_contact_at: DateTime<Utc>,
}

impl Entity for Client {
    type Id = ClientId;

    fn id(&self) -> ClientId {
        self.id
    }
}

impl SalesOwned for Client {
    fn sales_contact_id(&self) -> Option<UserId> {
        self.sales_contact_id
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewClient {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub company_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ClientUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub company_name: Option<String>,
}

fn validate_name(name: &str) -> DomainResult<()> {
    if name.trim().is_empty() {
        return Err(DomainError::validation("client name cannot be empty"));
    }
    Ok(())
}

fn validate_email(email: &str) -> DomainResult<()> {
    if !email.contains('@') {
        return Err(DomainError::validation(format!(
            "invalid client email '{email}'"
        )));
    }
    Ok(())
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

impl NewClient {
    pub fn validate(&self) -> DomainResult<()> {
        validate_name(&self.full_name)?;
        validate_email(&self.email)
    }

    /// Build the record; the creating salesperson becomes its contact.
    pub fn into_client(self, owner: UserId, now: DateTime<Utc>) -> Client {
        Client {
            id: ClientId::new(),
            full_name: self.full_name.trim().to_string(),
            email: self.email.trim().to_lowercase(),
            phone: non_blank(self.phone.as_deref()),
            company_name: non_blank(self.company_name.as_deref()),
            sales_contact_id: Some(owner),
            created_at: now,
            last_contact_at: now,
        }
    }
}

impl ClientUpdate {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(name) = &self.full_name {
            validate_name(name)?;
        }
        if let Some(email) = &self.email {
            validate_email(email)?;
        }
        Ok(())
    }

    /// Any update counts as a contact with the client.
    pub fn apply_to(&self, client: &mut Client, now: DateTime<Utc>) {
        if let Some(name) = &self.full_name {
            client.full_name = name.trim().to_string();
        }
        if let Some(email) = &self.email {
            client.email = email.trim().to_lowercase();
        }
        if self.phone.is_some() {
            client.phone = non_blank(self.phone.as_deref());
        }
        if self.company_name.is_some() {
            client.company_name = non_blank(self.company_name.as_deref());
        }
        client.last_contact_at = now;
    }
}
