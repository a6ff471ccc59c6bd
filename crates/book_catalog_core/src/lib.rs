pub mod catalog;
pub mod credentials;
pub mod domain;
pub mod ports;

pub use catalog::CatalogService;
pub use credentials::CredentialStore;
pub use domain::{Account, BookRecord, Partition, Principal, Role, ValidationError};
pub use ports::{PortError, PortResult, RecordStore};
