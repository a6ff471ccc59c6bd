//! services/api/src/web/error.rs
//!
//! The single mapping from request failures to HTTP responses. Every body is
//! `{"detail": "<message>"}`.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use book_catalog_core::ports::PortError;
use serde::Serialize;
use tracing::error;
use utoipa::ToSchema;

use crate::tokens::TokenError;

/// The error body returned by every failing endpoint.
#[derive(Serialize, ToSchema)]
pub struct ErrorBody {
    pub detail: String,
}

#[derive(Debug, thiserror::Error)]
pub enum HttpError {
    /// Missing, invalid or expired access token, or a token for an unknown account.
    #[error("Unauthorized credentials")]
    Unauthorized,
    #[error("No refresh token found in cookies")]
    MissingRefreshToken,
    #[error("Invalid or expired refresh token")]
    InvalidRefreshToken,
    /// Login with a username/password pair that does not match.
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Internal(String),
}

impl HttpError {
    pub fn status(&self) -> StatusCode {
        match self {
            HttpError::Unauthorized | HttpError::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
            HttpError::MissingRefreshToken => StatusCode::BAD_REQUEST,
            HttpError::InvalidCredentials | HttpError::Forbidden(_) => StatusCode::FORBIDDEN,
            HttpError::NotFound(_) => StatusCode::NOT_FOUND,
            HttpError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            HttpError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PortError> for HttpError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound(msg) => HttpError::NotFound(msg),
            PortError::Forbidden(msg) => HttpError::Forbidden(msg),
            PortError::Invalid(msg) => HttpError::Validation(msg),
            PortError::Unauthorized => HttpError::Unauthorized,
            PortError::Unexpected(msg) => HttpError::Internal(msg),
        }
    }
}

impl From<TokenError> for HttpError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid => HttpError::Unauthorized,
            TokenError::Signing(msg) => HttpError::Internal(msg),
        }
    }
}

impl IntoResponse for HttpError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = match &self {
            HttpError::Internal(msg) => {
                error!("Request failed: {}", msg);
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };
        let body = Json(ErrorBody { detail });

        match self {
            HttpError::Unauthorized => {
                (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
            }
            _ => (status, body).into_response(),
        }
    }
}
