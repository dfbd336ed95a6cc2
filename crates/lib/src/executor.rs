//! # Query Executor
//!
//! The boundary between the pipeline and the database. A failed statement is
//! logged and reported to consumers as the empty result, so an endpoint can
//! still answer (with an empty table) when generated SQL does not run.

use crate::{providers::db::storage::Storage, types::QueryOutput};
use tracing::{debug, error};

/// Executes `sql`, returning the empty result (no columns, no rows, zero
/// duration) on any connection or execution failure.
pub async fn execute_or_empty(storage: &dyn Storage, sql: &str) -> QueryOutput {
    match storage.execute_query(sql).await {
        Ok(output) => {
            debug!(
                backend = storage.name(),
                columns = output.columns.len(),
                rows = output.rows.len(),
                duration = output.duration_secs(),
                "Statement executed"
            );
            output
        }
        Err(e) => {
            error!(backend = storage.name(), sql = %sql, error = %e, "SQL execution failed");
            QueryOutput::default()
        }
    }
}
