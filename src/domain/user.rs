/// User entity
///
/// Users are the identity anchor: every habit and check-in belongs to exactly
/// one user. The core never checks passwords itself; it only stores the digest
/// produced by a `CredentialHasher`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Clock, DomainError, UserId};

/// A registered user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    /// Unique login name
    pub username: String,
    /// Output of the configured credential hasher; never serialized to clients
    #[serde(skip_serializing, default)]
    pub password_digest: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Create a new user with validation
    pub fn new(username: &str, password_digest: String, clock: &dyn Clock) -> Result<Self, DomainError> {
        let username = Self::validate_username(username)?;

        Ok(Self {
            id: UserId::new(),
            username,
            password_digest,
            created_at: clock.now(),
        })
    }

    /// Rebuild a user from stored data
    pub fn from_existing(
        id: UserId,
        username: String,
        password_digest: String,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            username,
            password_digest,
            created_at,
        }
    }

    /// Validate and normalize a username
    pub fn validate_username(username: &str) -> Result<String, DomainError> {
        let trimmed = username.trim();

        if trimmed.is_empty() {
            return Err(DomainError::validation("Username can't be blank"));
        }

        if trimmed.chars().any(char::is_whitespace) {
            return Err(DomainError::validation("Username can't contain spaces"));
        }

        Ok(trimmed.to_string())
    }

    /// Reject empty passwords before they reach the hasher
    pub fn validate_password(password: &str) -> Result<(), DomainError> {
        if password.is_empty() {
            return Err(DomainError::validation("Password can't be blank"));
        }
        Ok(())
    }
}
