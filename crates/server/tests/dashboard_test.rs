//! # Dashboard Endpoint Tests
//!
//! `GET /dashboard/{name}` runs a configured statement without any model call.

mod common;

use anyhow::Result;
use common::TestApp;
use serde_json::{json, Value};

#[tokio::test]
async fn test_pie_dashboard_counts_categories() -> Result<()> {
    let app = TestApp::spawn().await?;

    let response = app.get("/dashboard/pie").await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await?;
    assert_eq!(
        body,
        json!([
            {"state": "PUNJAB", "categorization": "over_exploited", "count": 2},
            {"state": "TELANGANA", "categorization": "safe", "count": 2},
            {"state": "TELANGANA", "categorization": "semi_critical", "count": 1}
        ])
    );
    Ok(())
}

#[tokio::test]
async fn test_bar_dashboard_reports_missing_stage_as_zero() -> Result<()> {
    let app = TestApp::spawn().await?;

    let response = app.get("/dashboard/bar").await;

    assert_eq!(200, response.status().as_u16());
    let rows: Vec<Value> = response.json().await?;
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0]["block"], "Khanna");
    assert_eq!(rows[0]["stage_of_ground_water_extraction_pct"], json!(164.7));
    // The configured statement overrides the SQL; zero_fill still comes from
    // the built-in bar dashboard.
    let last = rows.last().unwrap();
    assert_eq!(last["block"], "Doraha");
    assert_eq!(last["stage_of_ground_water_extraction_pct"], json!(0));
    Ok(())
}

#[tokio::test]
async fn test_dashboard_with_failing_sql_is_empty() -> Result<()> {
    let app = TestApp::spawn().await?;

    // The built-in trend statement is PostgreSQL-only and fails on SQLite.
    let response = app.get("/dashboard/trend").await;

    assert_eq!(200, response.status().as_u16());
    let body: Value = response.json().await?;
    assert_eq!(body, json!([]));
    Ok(())
}

#[tokio::test]
async fn test_unknown_dashboard_is_not_found() -> Result<()> {
    let app = TestApp::spawn().await?;

    let response = app.get("/dashboard/histogram").await;

    assert_eq!(404, response.status().as_u16());
    let body: Value = response.json().await?;
    assert_eq!(body["error"], "Unknown dashboard 'histogram'.");
    Ok(())
}
