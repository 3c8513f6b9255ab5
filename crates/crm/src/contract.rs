use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use epicevents_auth::ClientLinked;
use epicevents_core::{ClientId, ContractId, DomainError, DomainResult, Entity};

use crate::client::Client;

/// Contract record. Amounts are in cents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    /// `None` when the client was removed.
    pub client_id: Option<ClientId>,
    pub total_amount: i64,
    pub amount_due: i64,
    pub is_signed: bool,
    pub created_at: DateTime<Utc>,
}

impl Contract {
    pub fn is_paid(&self) -> bool {
        self.amount_due == 0
    }
}

impl Entity for Contract {
    type Id = ContractId;

    fn id(&self) -> ContractId {
        self.id
    }
}

/// A contract together with its (possibly missing) client snapshot.
///
/// Ownership of a contract is decided through this view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractView {
    pub contract: Contract,
    pub client: Option<Client>,
}

impl ClientLinked for ContractView {
    type Client = Client;

    fn client(&self) -> Option<&Client> {
        self.client.as_ref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewContract {
    pub client_id: ClientId,
    pub total_amount: i64,
    pub amount_due: i64,
    #[serde(default)]
    pub is_signed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ContractUpdate {
    pub total_amount: Option<i64>,
    pub amount_due: Option<i64>,
    pub is_signed: Option<bool>,
}

fn validate_amounts(total_amount: i64, amount_due: i64) -> DomainResult<()> {
    if total_amount < 0 || amount_due < 0 {
        return Err(DomainError::validation("contract amounts cannot be negative"));
    }
    if amount_due > total_amount {
        return Err(DomainError::validation(
            "amount due cannot exceed the total amount",
        ));
    }
    Ok(())
}

impl NewContract {
    pub fn validate(&self) -> DomainResult<()> {
        validate_amounts(self.total_amount, self.amount_due)
    }

    pub fn into_contract(self, now: DateTime<Utc>) -> Contract {
        Contract {
            id: ContractId::new(),
            client_id: Some(self.client_id),
            total_amount: self.total_amount,
            amount_due: self.amount_due,
            is_signed: self.is_signed,
            created_at: now,
        }
    }
}

impl ContractUpdate {
    /// Check the amounts as they would be after applying to `current`.
    pub fn validate_against(&self, current: &Contract) -> DomainResult<()> {
        validate_amounts(
            self.total_amount.unwrap_or(current.total_amount),
            self.amount_due.unwrap_or(current.amount_due),
        )
    }

    pub fn apply_to(&self, contract: &mut Contract) {
        if let Some(total) = self.total_amount {
            contract.total_amount = total;
        }
        if let Some(due) = self.amount_due {
            contract.amount_due = due;
        }
        if let Some(signed) = self.is_signed {
            contract.is_signed = signed;
        }
    }
}
