//! # Session Tokens
//!
//! Signed, time-bound session tokens (HS256 JWT) binding a user id and login.
//!
//! Validation is stateless: the signature and expiry are checked against the
//! shared secret only, no store lookup.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::user::User;
use crate::clock::{Clock, SystemClock};
use crate::config::TokenConfig;
use crate::errors::{ServiceError, ServiceResult};

/// Claims carried by a session token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,

    pub login: String,

    /// Issued at (Unix epoch seconds)
    pub iat: i64,

    /// Expiration (Unix epoch seconds)
    pub exp: i64,

    pub iss: String,

    /// Unique token id
    pub jti: String,
}

/// Identity resolved from a valid session token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionIdentity {
    pub user_id: Uuid,
    pub login: String,
}

/// Issues and validates session tokens
#[derive(Clone)]
pub struct SessionTokenCodec {
    issuer: String,
    expiration: Duration,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl SessionTokenCodec {
    pub fn new(config: &TokenConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Build a codec whose issuance time comes from `clock`
    pub fn with_clock(config: &TokenConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            issuer: config.issuer.clone(),
            expiration: config.expiration(),
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            clock,
        }
    }

    /// Issue a token for `user`, expiring a fixed horizon from now
    pub fn issue(&self, user: &User) -> ServiceResult<String> {
        let now = self.clock.now();
        let claims = SessionClaims {
            sub: user.id.to_string(),
            login: user.login.clone(),
            iat: now.timestamp(),
            exp: self.expires_at(now).timestamp(),
            iss: self.issuer.clone(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|_| ServiceError::Internal("token generation failed".into()))
    }

    /// Validate a token and return the identity it binds.
    ///
    /// Bad signature, expiry, wrong issuer and malformed input all fail with
    /// the same `Unauthorized`.
    pub fn validate(&self, token: &str) -> ServiceResult<SessionIdentity> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.leeway = 0;

        let data = decode::<SessionClaims>(token, &self.decoding_key, &validation).map_err(|e| {
            tracing::debug!(reason = ?e.kind(), "session token rejected");
            ServiceError::Unauthorized
        })?;

        let user_id = Uuid::parse_str(&data.claims.sub).map_err(|_| ServiceError::Unauthorized)?;
        Ok(SessionIdentity {
            user_id,
            login: data.claims.login,
        })
    }

    /// Expiry for a token issued at `issued_at`, saturating at the latest
    /// representable time
    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> DateTime<Utc> {
        issued_at
            .checked_add_signed(self.expiration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC)
    }
}
