//! # Identity Service
//!
//! Admin-gated registration, password authentication issuing session
//! tokens, token validation, and logout.

use std::sync::Arc;

use super::crypto::{
    constant_time_str_eq, hash_password, validate_login, verify_password, PasswordPolicy,
};
use super::jwt::{SessionIdentity, SessionTokenCodec};
use super::user::{User, UserStore};
use crate::cache::{DocumentCache, KeyPattern};
use crate::clock::{Clock, IdGenerator, RandomIds, SystemClock};
use crate::config::{ServiceConfig, TokenConfig};
use crate::context::RequestContext;
use crate::errors::{ServiceError, ServiceResult, StoreError};

const BEARER_PREFIX: &str = "Bearer ";

pub struct IdentityService {
    users: Arc<dyn UserStore>,
    cache: Arc<dyn DocumentCache>,
    codec: SessionTokenCodec,
    token_config: TokenConfig,
    admin_token: String,
    password_policy: PasswordPolicy,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl IdentityService {
    pub fn new(
        users: Arc<dyn UserStore>,
        cache: Arc<dyn DocumentCache>,
        config: &ServiceConfig,
    ) -> Self {
        Self {
            users,
            cache,
            codec: SessionTokenCodec::new(&config.jwt),
            token_config: config.jwt.clone(),
            admin_token: config.admin_token.clone(),
            password_policy: PasswordPolicy::strict(),
            clock: Arc::new(SystemClock),
            ids: Arc::new(RandomIds),
        }
    }

    /// Replace the time and id sources; token issuance follows the new clock
    pub fn with_sources(mut self, clock: Arc<dyn Clock>, ids: Arc<dyn IdGenerator>) -> Self {
        self.codec = SessionTokenCodec::with_clock(&self.token_config, clock.clone());
        self.clock = clock;
        self.ids = ids;
        self
    }

    /// Register a new user.
    ///
    /// Checks run in order: admin token, login, password, existing login.
    pub async fn register(
        &self,
        ctx: &RequestContext,
        admin_token: &str,
        login: &str,
        password: &str,
    ) -> ServiceResult<()> {
        ctx.ensure_active()?;

        if !constant_time_str_eq(admin_token, &self.admin_token) {
            tracing::warn!(request_id = %ctx.request_id, "registration rejected: bad admin token");
            return Err(ServiceError::Unauthorized);
        }

        validate_login(login)?;
        self.password_policy.validate(password)?;

        if ctx.bounded(self.users.exists(login)).await?? {
            return Err(ServiceError::Conflict(format!("login {} already exists", login)));
        }

        let user = User {
            id: self.ids.next_id(),
            login: login.to_string(),
            password_hash: hash_password(password)?,
            created_at: self.clock.now(),
        };

        ctx.bounded(self.users.create(&user)).await??;
        tracing::info!(
            request_id = %ctx.request_id,
            user_id = %user.id,
            login = %login,
            "user registered"
        );
        Ok(())
    }

    /// Verify credentials and issue a session token.
    ///
    /// Unknown logins and wrong passwords fail identically.
    pub async fn authenticate(
        &self,
        ctx: &RequestContext,
        login: &str,
        password: &str,
    ) -> ServiceResult<String> {
        ctx.ensure_active()?;

        let user = match ctx.bounded(self.users.find_by_login(login)).await? {
            Ok(user) => user,
            Err(StoreError::NotFound(_)) => {
                tracing::debug!(request_id = %ctx.request_id, "authentication failed");
                return Err(ServiceError::Unauthorized);
            }
            Err(e) => return Err(e.into()),
        };

        if !verify_password(password, &user.password_hash) {
            tracing::debug!(request_id = %ctx.request_id, "authentication failed");
            return Err(ServiceError::Unauthorized);
        }

        let token = self.codec.issue(&user)?;
        tracing::debug!(request_id = %ctx.request_id, user_id = %user.id, "session issued");
        Ok(token)
    }

    /// Drop every cache entry whose key contains `token`.
    ///
    /// The token itself stays valid until it expires.
    pub async fn logout(&self, ctx: &RequestContext, token: &str) {
        let raw = token.strip_prefix(BEARER_PREFIX).unwrap_or(token);
        let pattern = KeyPattern::containing(raw);

        match ctx.bounded(self.cache.delete_pattern(&pattern)).await {
            Ok(Ok(removed)) => {
                tracing::debug!(
                    request_id = %ctx.request_id,
                    removed,
                    "logout cleared cache entries"
                );
            }
            Ok(Err(e)) => {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    error = %e,
                    "logout cache cleanup failed"
                );
            }
            Err(_) => {
                tracing::warn!(
                    request_id = %ctx.request_id,
                    "logout cache cleanup abandoned at deadline"
                );
            }
        }
    }

    /// Validate a session token, with or without a `Bearer ` prefix
    pub fn validate_token(&self, token: &str) -> ServiceResult<SessionIdentity> {
        self.codec
            .validate(token.strip_prefix(BEARER_PREFIX).unwrap_or(token).trim())
    }
}
