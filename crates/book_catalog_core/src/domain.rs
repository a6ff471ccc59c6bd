//! crates/book_catalog_core/src/domain.rs
//!
//! Defines the pure, core data structures for the catalog.
//! These structs are independent of any storage or wire format.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lowest publication year a book may carry.
pub const MIN_PUBLICATION_YEAR: i32 = 1000;

//=========================================================================================
// Accounts and Principals
//=========================================================================================

/// The two access tiers known to the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered account. Only used internally for login - contains the password.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Account {
    pub id: u32,
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// The authenticated identity resolved from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: u32,
    pub username: String,
    pub role: Role,
}

impl From<&Account> for Principal {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            role: account.role,
        }
    }
}

//=========================================================================================
// Books
//=========================================================================================

/// One of the two role-segmented storage partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    Regular,
    Admin,
}

impl Partition {
    /// Stable position of the partition, used to index per-partition resources.
    pub fn index(&self) -> usize {
        match self {
            Partition::Regular => 0,
            Partition::Admin => 1,
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Partition::Regular => f.write_str("regular"),
            Partition::Admin => f.write_str("admin"),
        }
    }
}

/// Reasons a book is refused before it reaches storage.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Book name must not be empty")]
    EmptyName,
    #[error("Author must not be empty")]
    EmptyAuthor,
    #[error("Invalid publication year {year}: must be between {min} and {max}")]
    YearOutOfRange { year: i32, min: i32, max: i32 },
}

/// A single catalog entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookRecord {
    pub name: String,
    pub author: String,
    pub publication_year: i32,
}

impl BookRecord {
    pub fn new(name: impl Into<String>, author: impl Into<String>, publication_year: i32) -> Self {
        Self {
            name: name.into(),
            author: author.into(),
            publication_year,
        }
    }

    /// Checks the record against the write-time invariants.
    ///
    /// Surrounding whitespace is not significant, so a blank name counts as empty.
    /// `current_year` is passed in so the upper bound can be pinned in tests.
    pub fn validate(&self, current_year: i32) -> Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if self.author.trim().is_empty() {
            return Err(ValidationError::EmptyAuthor);
        }
        if self.publication_year < MIN_PUBLICATION_YEAR || self.publication_year > current_year {
            return Err(ValidationError::YearOutOfRange {
                year: self.publication_year,
                min: MIN_PUBLICATION_YEAR,
                max: current_year,
            });
        }
        Ok(())
    }

    /// Case-insensitive comparison used by delete-by-name, ignoring surrounding whitespace.
    pub fn name_matches(&self, name: &str) -> bool {
        normalize_name(&self.name) == normalize_name(name)
    }
}

/// The form under which names are compared for deletion.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase()
}
