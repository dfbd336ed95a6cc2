use crate::{errors::PromptError, types::QueryOutput};
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

/// A trait for interacting with a storage backend.
///
/// This trait defines a common interface for executing read-only statements
/// against different database providers (e.g., PostgreSQL, SQLite).
#[async_trait]
pub trait Storage: Send + Sync + DynClone + Debug {
    /// Returns the name of the storage provider (e.g., "PostgreSQL", "SQLite").
    fn name(&self) -> &str;

    /// Executes a statement and materializes every row.
    ///
    /// Implementations open a fresh connection per call and release it before
    /// returning, whether or not the statement succeeded.
    async fn execute_query(&self, sql: &str) -> Result<QueryOutput, PromptError>;
}

dyn_clone::clone_trait_object!(Storage);
