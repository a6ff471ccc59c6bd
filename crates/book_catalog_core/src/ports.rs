//! crates/book_catalog_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the catalog's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of the concrete storage backend.

use async_trait::async_trait;

use crate::domain::{BookRecord, Partition, ValidationError};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Invalid input: {0}")]
    Invalid(String),
    #[error("Unauthorized")]
    Unauthorized,
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
}

impl From<ValidationError> for PortError {
    fn from(err: ValidationError) -> Self {
        PortError::Invalid(err.to_string())
    }
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// Persistent, ordered storage of books, one sequence per partition.
///
/// Implementations must serialise writers to the same partition; readers see
/// either the state before or after a completed write.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Returns every record of the partition in stored order.
    async fn list(&self, partition: Partition) -> PortResult<Vec<BookRecord>>;

    /// Validates and appends a record, creating the partition if needed.
    async fn append(&self, partition: Partition, record: &BookRecord) -> PortResult<()>;

    /// Removes every record whose name matches case-insensitively.
    ///
    /// Returns the number of removed records, or `NotFound` when none matched.
    async fn delete(&self, partition: Partition, name: &str) -> PortResult<usize>;
}
