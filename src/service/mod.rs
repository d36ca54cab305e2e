/// Application services built on the domain and storage layers
///
/// The Completion Service owns the one-check-in-per-day rule; both storage
/// backends route check-in creation and removal through it.

pub mod completion;
pub mod credentials;

pub use completion::CompletionService;
pub use credentials::{CredentialHasher, Sha256Hasher};

use thiserror::Error;

use crate::domain::{DomainError, Outcome};
use crate::storage::StorageError;

/// Failure of a service operation
///
/// Domain failures are recoverable and become `Outcome::Failure` at the
/// adapter boundary; storage failures are outages and propagate.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Fold a service result into the adapter contract's shape
pub fn into_outcome<T>(result: Result<T, ServiceError>) -> Result<Outcome<T>, StorageError> {
    match result {
        Ok(data) => Ok(Outcome::success(data)),
        Err(ServiceError::Domain(error)) => Ok(error.into()),
        Err(ServiceError::Storage(error)) => Err(error),
    }
}
