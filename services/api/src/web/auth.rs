//! services/api/src/web/auth.rs
//!
//! Authentication endpoints: password login and refresh-token rotation.

use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Form, Json,
};
use book_catalog_core::Principal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::web::error::{ErrorBody, HttpError};
use crate::web::state::AppState;

/// Name of the cookie carrying the refresh token.
pub const REFRESH_COOKIE: &str = "refresh_token";

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
}

impl TokenResponse {
    fn bearer(access_token: String) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /login - Exchange a username and password for tokens
#[utoipa::path(
    post,
    path = "/login",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Login successful; refresh token set as cookie", body = TokenResponse),
        (status = 403, description = "Invalid credentials", body = ErrorBody)
    ),
    tag = "Authentication"
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Result<impl IntoResponse, HttpError> {
    // 1. Check the credentials
    let account = state
        .accounts
        .authenticate(&form.username, &form.password)
        .ok_or_else(|| {
            warn!("Rejected login for '{}'", form.username);
            HttpError::InvalidCredentials
        })?;
    let principal = Principal::from(account);

    // 2. Issue both tokens
    let access_token = state.tokens.issue_access(&principal)?;
    let refresh_token = state.tokens.issue_refresh(&principal)?;
    info!("User {} logged in", principal.username);

    // 3. Return the access token, refresh token rides in the cookie
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, refresh_cookie(&refresh_token))],
        Json(TokenResponse::bearer(access_token)),
    ))
}

/// POST /refresh - Rotate tokens using the refresh cookie
#[utoipa::path(
    post,
    path = "/refresh",
    responses(
        (status = 200, description = "New access token; refresh cookie reissued", body = TokenResponse),
        (status = 400, description = "No refresh token cookie", body = ErrorBody),
        (status = 401, description = "Invalid or expired refresh token", body = ErrorBody)
    ),
    tag = "Authentication"
)]
pub async fn refresh_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    // 1. Extract the refresh cookie
    let token = cookie_value(&headers, REFRESH_COOKIE).ok_or(HttpError::MissingRefreshToken)?;

    // 2. Verify it and re-resolve the account it was issued for
    let claims = state
        .tokens
        .verify_refresh(token)
        .map_err(|_| HttpError::InvalidRefreshToken)?;
    let account = state.accounts.find_by_id(claims.user_id).ok_or_else(|| {
        warn!("Refresh token for unknown user id {}", claims.user_id);
        HttpError::InvalidRefreshToken
    })?;
    let principal = Principal::from(account);

    // 3. Issue a fresh pair with the same claim shape as login
    let access_token = state.tokens.issue_access(&principal)?;
    let refresh_token = state.tokens.issue_refresh(&principal)?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, refresh_cookie(&refresh_token))],
        Json(TokenResponse::bearer(access_token)),
    ))
}

//=========================================================================================
// Cookie Helpers
//=========================================================================================

fn refresh_cookie(token: &str) -> String {
    format!(
        "{}={}; HttpOnly; Secure; SameSite=None; Path=/",
        REFRESH_COOKIE, token
    )
}

/// Finds a cookie by name across every `Cookie` header.
pub fn cookie_value<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .find_map(|c| {
            let (key, value) = c.trim().split_once('=')?;
            (key == name && !value.is_empty()).then_some(value)
        })
}
