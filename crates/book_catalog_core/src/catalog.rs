//! crates/book_catalog_core/src/catalog.rs
//!
//! The role-gated catalog operations. Every call receives an already
//! authenticated principal and delegates persistence to a `RecordStore`.

use chrono::{Datelike, Utc};
use std::sync::Arc;

use crate::domain::{BookRecord, Partition, Principal, Role};
use crate::ports::{PortError, PortResult, RecordStore};

#[derive(Clone)]
pub struct CatalogService {
    store: Arc<dyn RecordStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Books visible to the principal. Admins see the regular partition
    /// followed by the admin partition; a failure in either fails the call.
    pub async fn list_catalog(&self, principal: &Principal) -> PortResult<Vec<BookRecord>> {
        match principal.role {
            Role::User => self.store.list(Partition::Regular).await,
            Role::Admin => {
                let mut books = self.store.list(Partition::Regular).await?;
                books.extend(self.store.list(Partition::Admin).await?);
                Ok(books)
            }
        }
    }

    /// Adds a book to the regular partition. Admin only.
    pub async fn add_book(&self, principal: &Principal, record: BookRecord) -> PortResult<()> {
        require_admin(principal, "Only admin users can add books")?;
        record.validate(Utc::now().year())?;
        self.store.append(Partition::Regular, &record).await
    }

    /// Deletes every regular-partition book whose name matches. Admin only.
    pub async fn delete_book(&self, principal: &Principal, name: &str) -> PortResult<usize> {
        require_admin(principal, "Only admin users can delete books")?;
        self.store.delete(Partition::Regular, name).await
    }
}

fn require_admin(principal: &Principal, message: &str) -> PortResult<()> {
    match principal.role {
        Role::Admin => Ok(()),
        Role::User => Err(PortError::Forbidden(message.to_string())),
    }
}
