/// Public library interface for the Quest Tracker
///
/// Habits, daily check-ins, and streak statistics over two interchangeable
/// storage backends, plus the MCP server that exposes them.

use std::sync::Arc;

use thiserror::Error;

pub mod config;
pub mod domain;
pub mod service;
pub mod storage;

mod mcp;
mod tools;

// Re-export public modules and types
pub use config::{BackendKind, StorageConfig};
pub use domain::*;
pub use service::{CompletionService, CredentialHasher, ServiceError, Sha256Hasher};
pub use storage::{
    CheckInLedger, FileKeyValueStore, HabitStorage, KeyValueStore, LocalStorage, MemoryKeyValueStore,
    SqliteStorage, StorageBackend, StorageError,
};
pub use tools::HabitView;

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A storage backend bound to one authenticated user
///
/// The acting user is resolved once, at startup; every tool call afterwards
/// trusts it and scopes all operations to it.
pub struct QuestTrackerServer {
    storage: StorageBackend,
    clock: Arc<dyn Clock>,
    user: User,
}

impl QuestTrackerServer {
    /// Open the configured backend and sign in
    ///
    /// With `register` set, an unknown username is registered with the given
    /// password instead of being rejected.
    pub fn new(
        config: &StorageConfig,
        clock: Arc<dyn Clock>,
        username: &str,
        password: &str,
        register: bool,
    ) -> Result<Self, ServerError> {
        tracing::info!("Initializing Quest Tracker with {} backend", config.backend);

        let storage = StorageBackend::open(config, clock.clone())?;
        let user = Self::sign_in(&storage, username, password, register)?;
        tracing::info!("Signed in as {} ({})", user.username, user.id);

        Ok(Self { storage, clock, user })
    }

    fn sign_in(
        storage: &StorageBackend,
        username: &str,
        password: &str,
        register: bool,
    ) -> Result<User, ServerError> {
        if let Some(user) = storage.authenticate(username, password)? {
            return Ok(user);
        }
        if !register {
            return Err(ServerError::Authentication(DomainError::InvalidCredentials.to_string()));
        }

        match storage.create_user(username, password)? {
            Outcome::Success { data } => Ok(data),
            Outcome::Failure { errors } => Err(ServerError::Authentication(errors.join(", "))),
        }
    }

    /// Run the MCP server, handling JSON-RPC requests over stdin/stdout
    ///
    /// Returns when stdin is closed.
    pub async fn run(self) -> Result<(), ServerError> {
        let habits = self.storage.find_habits_for_user(self.user.id)?;
        tracing::info!("Server started, {} existing habits for {}", habits.len(), self.user.username);

        let mut mcp_server = mcp::McpServer::new(self);
        mcp_server.run().await
    }

    /// The storage backend (useful for testing)
    pub fn storage(&self) -> &StorageBackend {
        &self.storage
    }

    /// The signed-in user
    pub fn user(&self) -> &User {
        &self.user
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }
}
