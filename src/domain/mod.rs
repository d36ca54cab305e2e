/// Domain module containing the habit-completion rules
///
/// This module defines the core entities (User, Habit, CheckIn), the pure
/// streak calculations over check-in dates, and the tagged result shape that
/// every outer layer renders.

pub mod check_in;
pub mod habit;
pub mod outcome;
pub mod streak;
pub mod types;
pub mod user;

// Re-export public types for easy access
pub use check_in::CheckIn;
pub use habit::Habit;
pub use outcome::*;
pub use streak::*;
pub use types::*;
pub use user::User;

use thiserror::Error;

/// Recoverable failures of a domain operation
///
/// The `Display` text of each variant is the exact message handed to callers
/// in `Outcome::Failure`, so it is written for end users.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("{0}")]
    Validation(String),

    #[error("Habit does not belong to user")]
    NotOwner,

    #[error("You have already checked in for this habit today")]
    DuplicateCheckIn,

    #[error("Habit not found")]
    HabitNotFound,

    #[error("Check-in not found")]
    CheckInNotFound,

    #[error("User not found")]
    UserNotFound,

    #[error("Username has already been taken")]
    UsernameTaken,

    #[error("Invalid username or password")]
    InvalidCredentials,
}

impl DomainError {
    /// Shorthand for a validation failure with the given message
    pub fn validation(message: impl Into<String>) -> Self {
        DomainError::Validation(message.into())
    }
}
