pub mod accounts;
pub mod csv_store;

pub use accounts::load_credentials;
pub use csv_store::CsvRecordStore;
