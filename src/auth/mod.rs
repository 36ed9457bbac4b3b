//! # Identity
//!
//! Users, credential policy, session tokens and the identity service.

pub mod crypto;
pub mod jwt;
pub mod user;
pub mod service;

pub use crypto::{hash_password, validate_login, verify_password, PasswordPolicy};
pub use jwt::{SessionClaims, SessionIdentity, SessionTokenCodec};
pub use user::{InMemoryUserStore, User, UserStore};
pub use service::IdentityService;
