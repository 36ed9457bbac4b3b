//! # Credential Hashing
//!
//! Login and password policy, Argon2id password hashing, constant-time
//! secret comparison.
//!
//! Password hashes never leave the identity service; only the PHC string is
//! persisted.

use std::sync::OnceLock;

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use regex::Regex;
use subtle::ConstantTimeEq;

use crate::errors::{ServiceError, ServiceResult};

/// Minimum login length
pub const MIN_LOGIN_LENGTH: usize = 4;

fn login_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new("^[A-Za-z0-9]+$").expect("static login pattern"))
}

/// Validate a login: at least four ASCII letters or digits
pub fn validate_login(login: &str) -> ServiceResult<()> {
    if login.len() < MIN_LOGIN_LENGTH || !login_pattern().is_match(login) {
        return Err(ServiceError::invalid_input(format!(
            "login must be at least {} characters long and contain only letters and numbers",
            MIN_LOGIN_LENGTH
        )));
    }
    Ok(())
}

/// Password requirements configuration
#[derive(Debug, Clone)]
pub struct PasswordPolicy {
    pub min_length: usize,
    pub require_uppercase: bool,
    pub require_lowercase: bool,
    pub require_digit: bool,
    pub require_special: bool,
}

impl Default for PasswordPolicy {
    fn default() -> Self {
        Self {
            min_length: 8,
            require_uppercase: false,
            require_lowercase: false,
            require_digit: false,
            require_special: false,
        }
    }
}

impl PasswordPolicy {
    /// Four characters minimum with every character class present
    pub fn strict() -> Self {
        Self {
            min_length: 4,
            require_uppercase: true,
            require_lowercase: true,
            require_digit: true,
            require_special: true,
        }
    }

    /// Validate a password against this policy
    pub fn validate(&self, password: &str) -> ServiceResult<()> {
        let weak = |reason: &str| Err(ServiceError::invalid_input(format!("password {}", reason)));

        if password.chars().count() < self.min_length {
            return weak(&format!("must be at least {} characters long", self.min_length));
        }
        if self.require_uppercase && !password.chars().any(|c| c.is_ascii_uppercase()) {
            return weak("must contain an uppercase letter");
        }
        if self.require_lowercase && !password.chars().any(|c| c.is_ascii_lowercase()) {
            return weak("must contain a lowercase letter");
        }
        if self.require_digit && !password.chars().any(|c| c.is_ascii_digit()) {
            return weak("must contain a digit");
        }
        if self.require_special && !password.chars().any(|c| !c.is_ascii_alphanumeric()) {
            return weak("must contain a special character");
        }
        Ok(())
    }
}

/// Hash a password using Argon2id with a random salt
pub fn hash_password(password: &str) -> ServiceResult<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| ServiceError::Internal("password hashing failed".into()))
}

/// Verify a password against its stored hash.
///
/// An unparsable hash verifies as `false`.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Constant-time comparison of two strings
pub fn constant_time_str_eq(a: &str, b: &str) -> bool {
    a.as_bytes().ct_eq(b.as_bytes()).into()
}
