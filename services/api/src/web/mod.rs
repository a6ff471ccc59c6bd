pub mod auth;
pub mod books;
pub mod error;
pub mod middleware;
pub mod rest;
pub mod routes;
pub mod state;

// Re-export the pieces the server binary wires together.
pub use error::HttpError;
pub use middleware::require_auth;
pub use routes::{app_router, cors_layer};
pub use state::AppState;
