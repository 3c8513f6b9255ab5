//! User lookups consumed by the authentication service.

use std::sync::Arc;

use epicevents_core::{InMemoryRecordStore, RecordStore, UserId};

use crate::User;

/// Data-access seam for collaborator records.
///
/// Lookups by email expect an already-normalized (lowercased) address.
pub trait UserDirectory: Send + Sync {
    fn get(&self, id: UserId) -> Option<User>;
    fn find_by_email(&self, email: &str) -> Option<User>;
    fn find_by_employee_number(&self, employee_number: &str) -> Option<User>;
    fn save(&self, user: User);
    fn list(&self) -> Vec<User>;
}

impl<D: UserDirectory + ?Sized> UserDirectory for Arc<D> {
    fn get(&self, id: UserId) -> Option<User> {
        (**self).get(id)
    }

    fn find_by_email(&self, email: &str) -> Option<User> {
        (**self).find_by_email(email)
    }

    fn find_by_employee_number(&self, employee_number: &str) -> Option<User> {
        (**self).find_by_employee_number(employee_number)
    }

    fn save(&self, user: User) {
        (**self).save(user)
    }

    fn list(&self) -> Vec<User> {
        (**self).list()
    }
}

/// Directory backed by an in-memory record store.
#[derive(Debug, Default)]
pub struct InMemoryUserDirectory {
    store: InMemoryRecordStore<UserId, User>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserDirectory for InMemoryUserDirectory {
    fn get(&self, id: UserId) -> Option<User> {
        self.store.get(&id)
    }

    fn find_by_email(&self, email: &str) -> Option<User> {
        self.store.find(&|u: &User| u.email == email)
    }

    fn find_by_employee_number(&self, employee_number: &str) -> Option<User> {
        self.store
            .find(&|u: &User| u.employee_number == employee_number)
    }

    fn save(&self, user: User) {
        self.store.save(user);
    }

    fn list(&self) -> Vec<User> {
        self.store.list()
    }
}
