//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use book_catalog_core::{CredentialStore, Principal};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::tokens::TokenService;
use crate::web::error::HttpError;
use crate::web::state::AppState;

/// Pulls the token out of an `Authorization: Bearer <token>` header.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// Verifies the bearer token and resolves it to a known account.
///
/// Every failure collapses to `HttpError::Unauthorized`.
pub fn authorize(
    tokens: &TokenService,
    accounts: &CredentialStore,
    headers: &HeaderMap,
) -> Result<Principal, HttpError> {
    let token = bearer_token(headers).ok_or(HttpError::Unauthorized)?;
    let claims = tokens.verify_access(token).map_err(|e| {
        warn!("Rejected bearer token: {}", e);
        HttpError::from(e)
    })?;

    let account = accounts.find_by_id(claims.user_id).ok_or_else(|| {
        warn!("Access token for unknown user id {}", claims.user_id);
        HttpError::Unauthorized
    })?;

    debug!("Authenticated {} ({})", account.username, account.role);
    Ok(Principal::from(account))
}

/// Middleware that validates the bearer token and resolves the principal.
///
/// If valid, inserts the `Principal` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized with a Bearer challenge.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, HttpError> {
    let principal = authorize(&state.tokens, &state.accounts, req.headers())?;
    req.extensions_mut().insert(principal);
    Ok(next.run(req).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use book_catalog_core::Role;
    use jsonwebtoken::Algorithm;

    use crate::config::TokenSettings;

    fn tokens() -> TokenService {
        TokenService::new(&TokenSettings {
            access_secret: "access-secret".to_string(),
            refresh_secret: "refresh-secret".to_string(),
            algorithm: Algorithm::HS256,
            access_expire_minutes: 15,
            refresh_expire_minutes: 60,
        })
    }

    fn foreign_tokens() -> TokenService {
        TokenService::new(&TokenSettings {
            access_secret: "someone-elses-secret".to_string(),
            refresh_secret: "another-refresh".to_string(),
            algorithm: Algorithm::HS256,
            access_expire_minutes: 15,
            refresh_expire_minutes: 60,
        })
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token(&headers_with("Bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers_with("bearer abc")), Some("abc"));
        assert_eq!(bearer_token(&headers_with("Basic abc")), None);
        assert_eq!(bearer_token(&headers_with("Bearer ")), None);
        assert_eq!(bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn test_authorize_resolves_principal() {
        let tokens = tokens();
        let accounts = CredentialStore::seeded();
        let account = accounts.find_by_id(1).unwrap();
        let token = tokens.issue_access(&Principal::from(account)).unwrap();

        let principal =
            authorize(&tokens, &accounts, &headers_with(&format!("Bearer {token}"))).unwrap();
        assert_eq!(principal.id, 1);
        assert_eq!(principal.role, Role::User);
    }

    #[test]
    fn test_authorize_rejects_unknown_account() {
        let tokens = tokens();
        let accounts = CredentialStore::seeded();
        let ghost = Principal {
            id: 404,
            username: "ghost".to_string(),
            role: Role::Admin,
        };
        let token = tokens.issue_access(&ghost).unwrap();

        let result = authorize(&tokens, &accounts, &headers_with(&format!("Bearer {token}")));
        assert!(matches!(result, Err(HttpError::Unauthorized)));
    }

    #[test]
    fn test_authorize_rejects_refresh_token() {
        let tokens = tokens();
        let accounts = CredentialStore::seeded();
        let token = tokens
            .issue_refresh(&Principal::from(accounts.find_by_id(2).unwrap()))
            .unwrap();

        let result = authorize(&tokens, &accounts, &headers_with(&format!("Bearer {token}")));
        assert!(matches!(result, Err(HttpError::Unauthorized)));
    }

    #[test]
    fn test_authorize_rejects_foreign_signature() {
        let accounts = CredentialStore::seeded();
        let token = foreign_tokens()
            .issue_access(&Principal::from(accounts.find_by_id(1).unwrap()))
            .unwrap();

        let result = authorize(&tokens(), &accounts, &headers_with(&format!("Bearer {token}")));
        assert!(matches!(result, Err(HttpError::Unauthorized)));
    }
}
