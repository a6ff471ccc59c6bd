//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use book_catalog_core::ports::RecordStore;
use book_catalog_core::{CatalogService, CredentialStore};
use std::sync::Arc;

use crate::adapters::{load_credentials, CsvRecordStore};
use crate::config::Config;
use crate::error::ApiError;
use crate::tokens::TokenService;

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
///
/// Nothing here is mutated after construction; the record store does its own
/// locking.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub accounts: Arc<CredentialStore>,
    pub tokens: Arc<TokenService>,
    pub catalog: CatalogService,
}

impl AppState {
    /// Wires the CSV store, the credential table and the token service from config.
    pub fn from_config(config: Arc<Config>) -> Result<Self, ApiError> {
        let accounts = load_credentials(config.accounts_path.as_deref())?;
        let store: Arc<dyn RecordStore> = Arc::new(CsvRecordStore::new(config.storage_dir.clone()));
        Ok(Self::new(config, accounts, store))
    }

    pub fn new(config: Arc<Config>, accounts: CredentialStore, store: Arc<dyn RecordStore>) -> Self {
        Self {
            tokens: Arc::new(TokenService::new(&config.tokens)),
            accounts: Arc::new(accounts),
            catalog: CatalogService::new(store),
            config,
        }
    }
}
