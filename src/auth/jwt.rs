use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::{config::Config, errors::AppError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Bad signature, wrong kind, or not a token at all.
    #[error("malformed token")]
    Malformed,
    #[error("expired token")]
    Expired,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub iat: usize,

    pub typ: String, // "access" | "refresh"
    pub jti: String,
}

#[derive(Clone)]
pub struct Keys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl Keys {
    pub fn from_secret(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

/// Signs and verifies both token kinds. Each kind has its own secret and
/// lifetime, so an access token never verifies as a refresh token.
#[derive(Clone)]
pub struct TokenCodec {
    access: Keys,
    refresh: Keys,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl TokenCodec {
    pub fn new(cfg: &Config) -> Self {
        Self {
            access: Keys::from_secret(cfg.access_token_secret.as_bytes()),
            refresh: Keys::from_secret(cfg.refresh_token_secret.as_bytes()),
            access_ttl: Duration::seconds(cfg.jwt_access_ttl_seconds),
            refresh_ttl: Duration::seconds(cfg.jwt_refresh_ttl_seconds),
        }
    }

    fn keys(&self, kind: TokenKind) -> &Keys {
        match kind {
            TokenKind::Access => &self.access,
            TokenKind::Refresh => &self.refresh,
        }
    }

    pub fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }

    pub fn issue(
        &self,
        kind: TokenKind,
        user_id: ObjectId,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, AppError> {
        let expires_at = now + self.ttl(kind);
        let claims = Claims {
            sub: user_id.to_hex(),
            iat: now.timestamp() as usize,
            exp: expires_at.timestamp() as usize,
            typ: kind.as_str().into(),
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.keys(kind).encoding)
            .map_err(|e| AppError::Internal(format!("jwt encode: {e}")))?;

        Ok(IssuedToken { token, expires_at })
    }

    pub fn issue_access(&self, user_id: ObjectId, now: DateTime<Utc>) -> Result<IssuedToken, AppError> {
        self.issue(TokenKind::Access, user_id, now)
    }

    pub fn issue_refresh(&self, user_id: ObjectId, now: DateTime<Utc>) -> Result<IssuedToken, AppError> {
        self.issue(TokenKind::Refresh, user_id, now)
    }

    /// Returns the bound identity id. Expiry is judged against `now`, not
    /// the wall clock, so `now >= exp` is `Expired`.
    pub fn verify(
        &self,
        kind: TokenKind,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<ObjectId, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<Claims>(token, &self.keys(kind).decoding, &validation)
            .map_err(|_| TokenError::Malformed)?
            .claims;

        if claims.typ != kind.as_str() {
            return Err(TokenError::Malformed);
        }
        if now.timestamp() >= claims.exp as i64 {
            return Err(TokenError::Expired);
        }

        ObjectId::parse_str(&claims.sub).map_err(|_| TokenError::Malformed)
    }
}

pub fn sha256_hex(s: &str) -> String {
    let mut h = Sha256::new();
    h.update(s.as_bytes());
    hex::encode(h.finalize())
}

#[cfg(test)]
mod tests {
    use std::time::Duration as StdDuration;

    use super::*;
    use crate::config::StoreBackend;

    fn codec() -> TokenCodec {
        TokenCodec::new(&Config {
            store_backend: StoreBackend::Memory,
            mongodb_uri: None,
            db_name: "test".into(),
            access_token_secret: "access-secret".into(),
            refresh_token_secret: "refresh-secret".into(),
            jwt_access_ttl_seconds: 15 * 60,
            jwt_refresh_ttl_seconds: 10 * 24 * 60 * 60,
            store_timeout: StdDuration::from_secs(1),
            bind_addr: "127.0.0.1:0".into(),
            cors_origin: None,
            cookie_secure: true,
        })
    }

    #[test]
    fn access_token_valid_until_expiry() {
        let codec = codec();
        let id = ObjectId::new();
        let t = Utc::now();
        let issued = codec.issue_access(id, t).unwrap();

        assert_eq!(issued.expires_at, t + Duration::minutes(15));
        assert_eq!(codec.verify(TokenKind::Access, &issued.token, t), Ok(id));
        assert_eq!(
            codec.verify(TokenKind::Access, &issued.token, t + Duration::minutes(14)),
            Ok(id)
        );
        assert_eq!(
            codec.verify(TokenKind::Access, &issued.token, t + Duration::minutes(15)),
            Err(TokenError::Expired)
        );
        assert_eq!(
            codec.verify(TokenKind::Access, &issued.token, t + Duration::days(1)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn refresh_window_is_days() {
        let codec = codec();
        let id = ObjectId::new();
        let t = Utc::now();
        let issued = codec.issue_refresh(id, t).unwrap();

        assert_eq!(
            codec.verify(TokenKind::Refresh, &issued.token, t + Duration::days(9)),
            Ok(id)
        );
        assert_eq!(
            codec.verify(TokenKind::Refresh, &issued.token, t + Duration::days(10)),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn kinds_do_not_cross() {
        let codec = codec();
        let id = ObjectId::new();
        let t = Utc::now();
        let access = codec.issue_access(id, t).unwrap();
        let refresh = codec.issue_refresh(id, t).unwrap();

        assert_eq!(
            codec.verify(TokenKind::Refresh, &access.token, t),
            Err(TokenError::Malformed)
        );
        assert_eq!(
            codec.verify(TokenKind::Access, &refresh.token, t),
            Err(TokenError::Malformed)
        );
    }

    #[test]
    fn tampered_and_garbage_tokens_are_malformed() {
        let codec = codec();
        let t = Utc::now();
        let issued = codec.issue_access(ObjectId::new(), t).unwrap();

        let mut tampered = issued.token.clone();
        tampered.push('x');
        assert_eq!(
            codec.verify(TokenKind::Access, &tampered, t),
            Err(TokenError::Malformed)
        );
        assert_eq!(
            codec.verify(TokenKind::Access, "not.a.token", t),
            Err(TokenError::Malformed)
        );
        assert_eq!(codec.verify(TokenKind::Access, "", t), Err(TokenError::Malformed));
    }

    #[test]
    fn same_second_tokens_differ() {
        let codec = codec();
        let id = ObjectId::new();
        let t = Utc::now();
        let a = codec.issue_refresh(id, t).unwrap();
        let b = codec.issue_refresh(id, t).unwrap();
        assert_ne!(a.token, b.token);
        assert_ne!(sha256_hex(&a.token), sha256_hex(&b.token));
    }
}
