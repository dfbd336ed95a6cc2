use crate::{
    errors::PromptError,
    providers::db::storage::Storage,
    types::{QueryOutput, SqlValue},
};
use async_trait::async_trait;
use std::{
    fmt::{self, Debug},
    time::Instant,
};
use tracing::debug;
use turso::{Database, Value as TursoValue};

/// A provider for a local SQLite copy of the dataset, backed by Turso.
///
/// This provider holds a `Database` instance. When cloned, it shares the same
/// underlying database, so an in-memory database populated through one clone is
/// visible through every other.
#[derive(Clone)]
pub struct SqliteProvider {
    /// The Turso database instance. It's cloneable and thread-safe.
    pub db: Database,
}

impl SqliteProvider {
    /// Creates a new `SqliteProvider` from a file path or in-memory.
    ///
    /// # Arguments
    ///
    /// * `db_path`: The path to the SQLite database file. Use ":memory:" for a unique,
    ///   isolated in-memory database. To share an in-memory database across multiple
    ///   `SqliteProvider` instances (e.g., in tests), create one provider and
    ///   then `.clone()` it.
    pub async fn new(db_path: &str) -> Result<Self, PromptError> {
        let db = turso::Builder::new_local(db_path)
            .build()
            .await
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;

        let conn = db
            .connect()
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;
        // Use `query` for PRAGMA statements that return a value to avoid "unexpected row" errors.
        conn.query("PRAGMA journal_mode=WAL;", ())
            .await
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;

        Ok(Self { db })
    }

    /// Pre-populates data by executing `;`-separated SQL statements in order.
    pub async fn initialize_with_data(&self, init_sql: &str) -> Result<(), PromptError> {
        let conn = self
            .db
            .connect()
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;

        for statement in init_sql.split(';').filter(|s| !s.trim().is_empty()) {
            conn.execute(statement, ())
                .await
                .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?;
        }
        Ok(())
    }
}

impl Debug for SqliteProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteProvider").finish_non_exhaustive()
    }
}

fn turso_value_to_sql(v: TursoValue) -> SqlValue {
    match v {
        TursoValue::Null => SqlValue::Null,
        TursoValue::Integer(i) => SqlValue::Int(i),
        TursoValue::Real(f) => SqlValue::Float(f),
        TursoValue::Text(s) => SqlValue::Text(s),
        TursoValue::Blob(b) => SqlValue::Bytes(b),
    }
}

#[async_trait]
impl Storage for SqliteProvider {
    fn name(&self) -> &str {
        "SQLite"
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryOutput, PromptError> {
        debug!(sql = %sql, "--> Executing SQLite statement");

        // Get a new connection for this query.
        let conn = self
            .db
            .connect()
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;

        let start = Instant::now();
        let mut stmt = conn
            .prepare(sql)
            .await
            .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?;

        let columns: Vec<String> = stmt
            .columns()
            .iter()
            .map(|c| c.name().to_string())
            .collect();

        let mut rows = stmt
            .query(())
            .await
            .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?;

        let mut output_rows = Vec::new();
        while let Some(row) = rows
            .next()
            .await
            .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?
        {
            let mut cells = Vec::with_capacity(columns.len());
            for i in 0..columns.len() {
                let value = row
                    .get_value(i)
                    .map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?;
                cells.push(turso_value_to_sql(value));
            }
            output_rows.push(cells);
        }

        Ok(QueryOutput {
            columns,
            rows: output_rows,
            duration: start.elapsed(),
        })
    }
}
