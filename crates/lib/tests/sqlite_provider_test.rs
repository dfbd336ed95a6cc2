//! # SQLite Provider Tests
//!
//! These tests verify that the `SqliteProvider` materializes typed rows in
//! column order, that failures surface as errors from `execute_query`, and that
//! `execute_or_empty` turns those failures into the empty result.

mod common;

use crate::common::setup_tracing;
use aquifer::executor::execute_or_empty;
use aquifer::providers::db::{sqlite::SqliteProvider, storage::Storage};
use aquifer::sanitize::sanitize_rows;
use aquifer::{PromptError, QueryOutput, SqlValue};
use aquifer_test_utils::{FailingStorage, TestSetup};
use serde_json::json;

/// Verifies that rows come back with their column names and typed cells.
#[tokio::test]
async fn test_sqlite_provider_returns_typed_rows() {
    setup_tracing();
    let setup = TestSetup::new().await.expect("Failed to create fixture");

    let output = setup
        .provider
        .execute_query(
            "SELECT district, year, stage_of_ground_water_extraction_pct FROM attribute_data \
             WHERE state = 'TELANGANA' ORDER BY assessment_unit_name",
        )
        .await
        .expect("Failed to execute query");

    assert_eq!(
        output.columns,
        vec!["district", "year", "stage_of_ground_water_extraction_pct"]
    );
    assert_eq!(output.rows.len(), 3);
    assert_eq!(
        output.rows[0],
        vec![
            SqlValue::Text("ADILABAD".to_string()),
            SqlValue::Text("2019".to_string()),
            SqlValue::Float(32.0),
        ]
    );
}

/// Text sentinels and SQL NULLs become JSON null after sanitization.
#[tokio::test]
async fn test_sqlite_rows_sanitize_sentinels() {
    setup_tracing();
    let setup = TestSetup::new().await.expect("Failed to create fixture");

    let output = setup
        .provider
        .execute_query(
            "SELECT assessment_unit_name, total_extraction_ham, stage_of_ground_water_extraction_pct \
             FROM attribute_data WHERE state = 'PUNJAB' ORDER BY assessment_unit_name",
        )
        .await
        .expect("Failed to execute query");

    let table = sanitize_rows(&output);
    assert_eq!(
        serde_json::to_value(&table).unwrap(),
        json!([
            {"assessment_unit_name": "Doraha", "total_extraction_ham": null, "stage_of_ground_water_extraction_pct": null},
            {"assessment_unit_name": "Khanna", "total_extraction_ham": "1400.0", "stage_of_ground_water_extraction_pct": 164.7}
        ])
    );
}

/// Aggregates keep their aliases as column names.
#[tokio::test]
async fn test_sqlite_aggregate_columns() {
    setup_tracing();
    let setup = TestSetup::new().await.expect("Failed to create fixture");

    let output = setup
        .provider
        .execute_query("SELECT state, COUNT(*) AS count FROM attribute_data GROUP BY state ORDER BY state")
        .await
        .expect("Failed to execute query");

    assert_eq!(output.columns, vec!["state", "count"]);
    assert_eq!(
        output.rows,
        vec![
            vec![SqlValue::Text("ANDAMAN AND NICOBAR ISLANDS".into()), SqlValue::Int(1)],
            vec![SqlValue::Text("PUNJAB".into()), SqlValue::Int(2)],
            vec![SqlValue::Text("TELANGANA".into()), SqlValue::Int(3)],
        ]
    );
}

/// A failing statement is an error from `execute_query`.
#[tokio::test]
async fn test_sqlite_invalid_statement_is_an_error() {
    setup_tracing();
    let setup = TestSetup::new().await.expect("Failed to create fixture");

    let result = setup.provider.execute_query("SELECT * FROM no_such_table").await;

    match result {
        Err(PromptError::StorageOperationFailed(msg)) => {
            assert!(msg.contains("no_such_table"), "unexpected message: {msg}");
        }
        other => panic!("Expected StorageOperationFailed, but got {other:?}"),
    }
}

/// At the executor boundary, the same failure becomes `([], [], 0)`.
#[tokio::test]
async fn test_execute_or_empty_swallows_failures() {
    setup_tracing();
    let setup = TestSetup::new().await.expect("Failed to create fixture");

    let output = execute_or_empty(&setup.provider, "SELECT * FROM no_such_table").await;
    assert_eq!(output, QueryOutput::default());
    assert_eq!(output.duration_secs(), 0.0);

    let output = execute_or_empty(&FailingStorage, "SELECT 1").await;
    assert_eq!(output, QueryOutput::default());
}

/// A successful statement passes through unchanged and reports a duration.
#[tokio::test]
async fn test_execute_or_empty_passes_results_through() {
    setup_tracing();
    let setup = TestSetup::new().await.expect("Failed to create fixture");

    let output = execute_or_empty(&setup.provider, "SELECT COUNT(*) AS n FROM attribute_data").await;
    assert_eq!(output.columns, vec!["n"]);
    assert_eq!(output.rows, vec![vec![SqlValue::Int(6)]]);
    assert!(output.duration_secs() >= 0.0);
}

/// Clones share the same in-memory database; fresh providers do not.
#[tokio::test]
async fn test_sqlite_in_memory_is_isolated() {
    setup_tracing();

    let provider1 = SqliteProvider::new(":memory:")
        .await
        .expect("Failed to create provider 1");
    provider1
        .initialize_with_data("CREATE TABLE t1 (id INTEGER); INSERT INTO t1 (id) VALUES (1);")
        .await
        .expect("Failed to initialize provider 1");

    let shared = provider1.clone();
    let output = shared.execute_query("SELECT id FROM t1").await.unwrap();
    assert_eq!(output.rows, vec![vec![SqlValue::Int(1)]]);

    let provider2 = SqliteProvider::new(":memory:")
        .await
        .expect("Failed to create provider 2");
    assert!(provider2.execute_query("SELECT * FROM t1").await.is_err());
}

/// The fixture can live in a file, as the CLI's `--sqlite` option expects.
#[tokio::test]
async fn test_sqlite_file_database() {
    setup_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("groundwater.db");
    let path = path.to_str().unwrap();

    TestSetup::at(path).await.expect("Failed to create file fixture");

    let reopened = SqliteProvider::new(path).await.unwrap();
    let output = reopened
        .execute_query("SELECT COUNT(*) FROM attribute_data")
        .await
        .unwrap();
    assert_eq!(output.rows, vec![vec![SqlValue::Int(6)]]);
}
