//! services/api/src/tokens.rs
//!
//! Issues and verifies the signed, time-limited access and refresh tokens.
//! Each class has its own secret and lifetime, and carries its class in the
//! claims so a token minted for one flow never verifies in the other.

use book_catalog_core::Principal;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{TokenSettings, MAX_EXPIRE_MINUTES};

/// Which flow a token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// JWT claims payload shared by both token classes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: u32,
    pub username: String,
    pub token_type: TokenKind,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Bad signature, expired, wrong class or missing claims. Deliberately uniform.
    #[error("Invalid or expired token")]
    Invalid,
    #[error("Failed to sign token: {0}")]
    Signing(String),
}

struct KeyPair {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl KeyPair {
    fn new(secret: &str, minutes: i64) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::minutes(minutes.clamp(0, MAX_EXPIRE_MINUTES)),
        }
    }
}

/// Token handler for both flows.
pub struct TokenService {
    algorithm: Algorithm,
    access: KeyPair,
    refresh: KeyPair,
}

impl TokenService {
    pub fn new(settings: &TokenSettings) -> Self {
        Self {
            algorithm: settings.algorithm,
            access: KeyPair::new(&settings.access_secret, settings.access_expire_minutes),
            refresh: KeyPair::new(&settings.refresh_secret, settings.refresh_expire_minutes),
        }
    }

    pub fn issue_access(&self, principal: &Principal) -> Result<String, TokenError> {
        self.sign(TokenKind::Access, principal, self.access.ttl)
    }

    pub fn issue_refresh(&self, principal: &Principal) -> Result<String, TokenError> {
        self.sign(TokenKind::Refresh, principal, self.refresh.ttl)
    }

    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(TokenKind::Access, token)
    }

    pub fn verify_refresh(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify(TokenKind::Refresh, token)
    }

    fn keys(&self, kind: TokenKind) -> &KeyPair {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    fn sign(&self, kind: TokenKind, principal: &Principal, ttl: Duration) -> Result<String, TokenError> {
        let now = Utc::now();
        let expires = now
            .checked_add_signed(ttl)
            .ok_or_else(|| TokenError::Signing(format!("expiry {}m out of range", ttl.num_minutes())))?;
        let claims = Claims {
            user_id: principal.id,
            username: principal.username.clone(),
            token_type: kind,
            iat: now.timestamp(),
            exp: expires.timestamp(),
        };

        debug!(
            "Issuing {:?} token for user {} ({}), expires in {}m",
            kind,
            principal.username,
            principal.id,
            ttl.num_minutes()
        );

        encode(&Header::new(self.algorithm), &claims, &self.keys(kind).encoding)
            .map_err(|e| TokenError::Signing(e.to_string()))
    }

    fn verify(&self, kind: TokenKind, token: &str) -> Result<Claims, TokenError> {
        let mut validation = Validation::new(self.algorithm);
        validation.leeway = 0;

        let claims = decode::<Claims>(token, &self.keys(kind).decoding, &validation)
            .map_err(|e| {
                debug!("Rejected {:?} token: {}", kind, e);
                TokenError::Invalid
            })?
            .claims;

        if claims.token_type != kind {
            debug!("Rejected {:?} token presented as {:?}", claims.token_type, kind);
            return Err(TokenError::Invalid);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use book_catalog_core::Role;

    fn settings(access: &str, refresh: &str) -> TokenSettings {
        TokenSettings {
            access_secret: access.to_string(),
            refresh_secret: refresh.to_string(),
            algorithm: Algorithm::HS256,
            access_expire_minutes: 15,
            refresh_expire_minutes: 60 * 24,
        }
    }

    fn principal() -> Principal {
        Principal {
            id: 2,
            username: "sampleadmin".to_string(),
            role: Role::Admin,
        }
    }

    #[test]
    fn test_access_round_trip() {
        let service = TokenService::new(&settings("access-secret", "refresh-secret"));
        let token = service.issue_access(&principal()).unwrap();

        let claims = service.verify_access(&token).unwrap();
        assert_eq!(claims.user_id, 2);
        assert_eq!(claims.username, "sampleadmin");
        assert_eq!(claims.token_type, TokenKind::Access);
        assert_eq!(claims.exp - claims.iat, 15 * 60);
    }

    #[test]
    fn test_refresh_lives_longer() {
        let service = TokenService::new(&settings("access-secret", "refresh-secret"));
        let token = service.issue_refresh(&principal()).unwrap();

        let claims = service.verify_refresh(&token).unwrap();
        assert_eq!(claims.user_id, 2);
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn test_cross_use_rejected() {
        let service = TokenService::new(&settings("access-secret", "refresh-secret"));
        let access = service.issue_access(&principal()).unwrap();
        let refresh = service.issue_refresh(&principal()).unwrap();

        assert!(matches!(service.verify_refresh(&access), Err(TokenError::Invalid)));
        assert!(matches!(service.verify_access(&refresh), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_token_kind_checked_even_with_shared_secret() {
        let service = TokenService::new(&settings("same-secret", "same-secret"));
        let refresh = service.issue_refresh(&principal()).unwrap();
        assert!(matches!(service.verify_access(&refresh), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = TokenService::new(&settings("access-secret", "refresh-secret"));
        let expired = service
            .sign(TokenKind::Access, &principal(), Duration::seconds(-5))
            .unwrap();
        assert!(matches!(service.verify_access(&expired), Err(TokenError::Invalid)));

        let expired = service
            .sign(TokenKind::Refresh, &principal(), Duration::seconds(-5))
            .unwrap();
        assert!(matches!(service.verify_refresh(&expired), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_unrepresentable_expiry_is_a_signing_error() {
        let service = TokenService::new(&settings("access-secret", "refresh-secret"));
        let result = service.sign(TokenKind::Access, &principal(), Duration::days(365 * 1_000_000));
        assert!(matches!(result, Err(TokenError::Signing(_))));
    }

    #[test]
    fn test_lifetime_clamped_to_cap() {
        let mut huge = settings("access-secret", "refresh-secret");
        huge.refresh_expire_minutes = i64::MAX;
        let service = TokenService::new(&huge);

        let claims = service
            .verify_refresh(&service.issue_refresh(&principal()).unwrap())
            .unwrap();
        assert_eq!(claims.exp - claims.iat, MAX_EXPIRE_MINUTES * 60);
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let ours = TokenService::new(&settings("access-secret", "refresh-secret"));
        let theirs = TokenService::new(&settings("other-access", "other-refresh"));
        let token = theirs.issue_access(&principal()).unwrap();
        assert!(matches!(ours.verify_access(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_missing_user_id_rejected() {
        #[derive(Serialize)]
        struct Partial {
            username: String,
            token_type: TokenKind,
            exp: i64,
        }
        let service = TokenService::new(&settings("access-secret", "refresh-secret"));
        let token = encode(
            &Header::new(Algorithm::HS256),
            &Partial {
                username: "ghost".to_string(),
                token_type: TokenKind::Access,
                exp: (Utc::now() + Duration::minutes(5)).timestamp(),
            },
            &EncodingKey::from_secret(b"access-secret"),
        )
        .unwrap();
        assert!(matches!(service.verify_access(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_garbage_rejected() {
        let service = TokenService::new(&settings("access-secret", "refresh-secret"));
        assert!(matches!(service.verify_access("invalid.token.here"), Err(TokenError::Invalid)));
        assert!(matches!(service.verify_refresh(""), Err(TokenError::Invalid)));
    }
}
