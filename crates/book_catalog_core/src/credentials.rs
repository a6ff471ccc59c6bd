//! crates/book_catalog_core/src/credentials.rs
//!
//! The read-only table of registered accounts. It is built once at startup and
//! handed to whoever needs to authenticate or resolve principals.

use std::collections::HashSet;

use crate::domain::{Account, Role};
use crate::ports::{PortError, PortResult};

/// In-memory, immutable account table.
#[derive(Debug, Clone)]
pub struct CredentialStore {
    accounts: Vec<Account>,
}

impl CredentialStore {
    /// Builds the table, rejecting duplicate ids or usernames.
    pub fn new(accounts: Vec<Account>) -> PortResult<Self> {
        check_unique(&accounts)?;
        Ok(Self { accounts })
    }

    /// The two sample accounts the service ships with.
    pub fn seeded() -> Self {
        Self {
            accounts: vec![
                Account {
                    id: 1,
                    username: "sampleuser".to_string(),
                    password: "samplepass".to_string(),
                    role: Role::User,
                },
                Account {
                    id: 2,
                    username: "sampleadmin".to_string(),
                    password: "samplepass".to_string(),
                    role: Role::Admin,
                },
            ],
        }
    }

    /// Returns the account only if the username exists and the password matches exactly.
    ///
    /// Passwords are compared in plain text; an unknown user and a wrong
    /// password are indistinguishable to the caller.
    pub fn authenticate(&self, username: &str, password: &str) -> Option<&Account> {
        self.accounts
            .iter()
            .find(|a| a.username == username)
            .filter(|a| a.password == password)
    }

    pub fn find_by_id(&self, id: u32) -> Option<&Account> {
        self.accounts.iter().find(|a| a.id == id)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

fn check_unique(accounts: &[Account]) -> PortResult<()> {
    let mut ids = HashSet::new();
    let mut usernames = HashSet::new();
    for account in accounts {
        if !ids.insert(account.id) {
            return Err(PortError::Invalid(format!("duplicate account id {}", account.id)));
        }
        if !usernames.insert(account.username.as_str()) {
            return Err(PortError::Invalid(format!(
                "duplicate username '{}'",
                account.username
            )));
        }
    }
    Ok(())
}
