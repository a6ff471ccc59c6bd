//! services/api/src/web/books.rs
//!
//! Catalog endpoints. All of them sit behind `require_auth`, so each handler
//! receives the resolved `Principal` from the request extensions.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use book_catalog_core::{BookRecord, Principal};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::web::error::{ErrorBody, HttpError};
use crate::web::state::AppState;

//=========================================================================================
// API Payload Structs
//=========================================================================================

/// A catalog row as listed by `/home`, keyed by the storage header names.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookRow {
    #[serde(rename = "Book Name")]
    pub name: String,
    #[serde(rename = "Author")]
    pub author: String,
    #[serde(rename = "Publication Year")]
    pub publication_year: i32,
}

impl From<BookRecord> for BookRow {
    fn from(book: BookRecord) -> Self {
        Self {
            name: book.name,
            author: book.author,
            publication_year: book.publication_year,
        }
    }
}

/// The body accepted by `/addBook`.
#[derive(Deserialize, ToSchema)]
pub struct NewBook {
    pub name: String,
    pub author: String,
    pub publication_year: i32,
}

#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DeleteBookParams {
    /// Name of the book to remove, matched case-insensitively.
    pub book_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /home - List the books visible to the caller
#[utoipa::path(
    get,
    path = "/home",
    responses(
        (status = 200, description = "Books visible to the caller's role", body = [BookRow]),
        (status = 401, description = "Missing or invalid access token", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "Books"
)]
pub async fn home_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<Vec<BookRow>>, HttpError> {
    let books = state.catalog.list_catalog(&principal).await?;
    Ok(Json(books.into_iter().map(BookRow::from).collect()))
}

/// POST /addBook - Add a book to the regular catalog (admin only)
#[utoipa::path(
    post,
    path = "/addBook",
    request_body = NewBook,
    responses(
        (status = 201, description = "Book added", body = MessageResponse),
        (status = 401, description = "Missing or invalid access token", body = ErrorBody),
        (status = 403, description = "Caller is not an admin", body = ErrorBody),
        (status = 422, description = "Invalid book fields", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "Books"
)]
pub async fn add_book_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Json(book): Json<NewBook>,
) -> Result<impl IntoResponse, HttpError> {
    let record = BookRecord::new(book.name, book.author, book.publication_year);
    state.catalog.add_book(&principal, record.clone()).await?;
    info!("{} added '{}' ({})", principal.username, record.name, record.publication_year);

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Book added successfully".to_string(),
        }),
    ))
}

/// DELETE /deleteBook - Remove every book with the given name (admin only)
#[utoipa::path(
    delete,
    path = "/deleteBook",
    params(DeleteBookParams),
    responses(
        (status = 204, description = "Book(s) deleted"),
        (status = 401, description = "Missing or invalid access token", body = ErrorBody),
        (status = 403, description = "Caller is not an admin", body = ErrorBody),
        (status = 404, description = "No book with that name", body = ErrorBody),
        (status = 422, description = "Missing book_name", body = ErrorBody)
    ),
    security(("bearer" = [])),
    tag = "Books"
)]
pub async fn delete_book_handler(
    State(state): State<Arc<AppState>>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<DeleteBookParams>,
) -> Result<StatusCode, HttpError> {
    let name = params
        .book_name
        .ok_or_else(|| HttpError::Validation("book_name is required".to_string()))?;

    let removed = state.catalog.delete_book(&principal, &name).await?;
    info!("{} deleted {} row(s) named '{}'", principal.username, removed, name);
    Ok(StatusCode::NO_CONTENT)
}
