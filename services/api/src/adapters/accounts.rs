//! services/api/src/adapters/accounts.rs
//!
//! Builds the credential table at startup, either from the built-in sample
//! accounts or from a JSON file of `{id, username, password, role}` objects.

use book_catalog_core::domain::Account;
use book_catalog_core::ports::{PortError, PortResult};
use book_catalog_core::CredentialStore;
use std::path::Path;
use tracing::{info, warn};

pub fn load_credentials(path: Option<&Path>) -> PortResult<CredentialStore> {
    let Some(path) = path else {
        info!("No ACCOUNTS_PATH configured, using the built-in sample accounts");
        return Ok(CredentialStore::seeded());
    };

    let raw = std::fs::read_to_string(path).map_err(|e| {
        PortError::Unexpected(format!("failed to read {}: {}", path.display(), e))
    })?;
    let accounts: Vec<Account> = serde_json::from_str(&raw)
        .map_err(|e| PortError::Invalid(format!("{}: {}", path.display(), e)))?;

    let store = CredentialStore::new(accounts)?;
    if store.is_empty() {
        warn!("{} lists no accounts, every login will be refused", path.display());
    } else {
        info!("Loaded {} accounts from {}", store.len(), path.display());
    }
    Ok(store)
}
