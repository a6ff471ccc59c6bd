//! services/api/src/web/routes.rs
//!
//! Assembles the axum router: public routes, the protected catalog routes
//! behind `require_auth`, and the CORS policy.

use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware as axum_middleware,
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::warn;

use crate::web::auth::{login_handler, refresh_handler};
use crate::web::books::{add_book_handler, delete_book_handler, home_handler};
use crate::web::middleware::require_auth;
use crate::web::rest::root_handler;
use crate::web::state::AppState;

/// Builds the application router with its state attached.
pub fn app_router(state: Arc<AppState>) -> Router {
    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/", get(root_handler))
        .route("/login", post(login_handler))
        .route("/refresh", post(refresh_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/home", get(home_handler))
        .route("/addBook", post(add_book_handler))
        .route("/deleteBook", delete(delete_book_handler))
        .layer(axum_middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}

/// CORS policy allowing credentialed requests from the configured origins.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_credentials(true)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT])
}
