/// Tagged success/failure values handed to presentation layers
///
/// Every adapter operation reports domain failures as data rather than as an
/// error so that a UI can render the messages directly.

use serde::Serialize;

use crate::domain::{CheckIn, DomainError, Habit, User};

/// Either the payload of a successful operation or the list of reasons it failed
///
/// Serializes as `{"status": "success", "data": ...}` or
/// `{"status": "failure", "errors": [...]}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome<T> {
    Success { data: T },
    Failure { errors: Vec<String> },
}

/// Result of creating a habit
pub type HabitResult = Outcome<Habit>;
/// Result of creating a check-in
pub type CheckInResult = Outcome<CheckIn>;
/// Result of deleting a habit or check-in
pub type DeleteResult = Outcome<()>;
/// Result of registering a user
pub type AuthResult = Outcome<User>;

impl<T> Outcome<T> {
    pub fn success(data: T) -> Self {
        Outcome::Success { data }
    }

    /// A failure carrying a single message
    pub fn failure(message: impl Into<String>) -> Self {
        Outcome::Failure {
            errors: vec![message.into()],
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Success { .. })
    }

    /// The payload, if the operation succeeded
    pub fn data(&self) -> Option<&T> {
        match self {
            Outcome::Success { data } => Some(data),
            Outcome::Failure { .. } => None,
        }
    }

    /// Consume the outcome, keeping the payload
    pub fn into_data(self) -> Option<T> {
        match self {
            Outcome::Success { data } => Some(data),
            Outcome::Failure { .. } => None,
        }
    }

    /// Failure messages; empty on success
    pub fn errors(&self) -> &[String] {
        match self {
            Outcome::Success { .. } => &[],
            Outcome::Failure { errors } => errors,
        }
    }
}

impl<T> From<DomainError> for Outcome<T> {
    fn from(error: DomainError) -> Self {
        Outcome::failure(error.to_string())
    }
}

impl<T> From<Result<T, DomainError>> for Outcome<T> {
    fn from(result: Result<T, DomainError>) -> Self {
        match result {
            Ok(data) => Outcome::success(data),
            Err(error) => error.into(),
        }
    }
}
