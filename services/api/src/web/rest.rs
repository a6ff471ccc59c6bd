//! services/api/src/web/rest.rs
//!
//! The unauthenticated welcome endpoint and the master definition for the
//! OpenAPI specification.

use axum::Json;
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::web::auth::{self, LoginForm, TokenResponse};
use crate::web::books::{self, BookRow, MessageResponse, NewBook};
use crate::web::error::ErrorBody;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        root_handler,
        auth::login_handler,
        auth::refresh_handler,
        books::home_handler,
        books::add_book_handler,
        books::delete_book_handler,
    ),
    components(
        schemas(LoginForm, TokenResponse, BookRow, NewBook, MessageResponse, ErrorBody)
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Authentication", description = "Login and token refresh."),
        (name = "Books", description = "Role-gated access to the book catalog.")
    )
)]
pub struct ApiDoc;

/// Registers the bearer scheme referenced by the protected paths.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// GET / - Liveness and welcome message
#[utoipa::path(
    get,
    path = "/",
    responses((status = 200, description = "Service is up", body = MessageResponse))
)]
pub async fn root_handler() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Hello World!".to_string(),
    })
}
