#![allow(dead_code)]
//! # Common Test Utilities
//!
//! Shared setup for the library integration tests.

use aquifer::{PromptTemplate, QueryPipeline, SchemaContext, Task};
use aquifer_test_utils::{MockAiProvider, MockTranslator, TestSetup};
use std::sync::Once;

static INIT: Once = Once::new();

/// Initializes the tracing subscriber once per test binary.
pub fn setup_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
    });
}

/// Substrings of the default system prompts, used to program `MockAiProvider`.
pub const SQL_KEY: &str = "SQL generator";
pub const SUMMARY_KEY: &str = "helpful assistant";
pub const FORECAST_KEY: &str = "data scientist";

pub const TEST_SCHEMA: &str = r#"{"attribute_data": {"state": "text", "year": "text"}}"#;

/// A pipeline over the groundwater fixture with every model call served by `ai`.
pub async fn fixture_pipeline(ai: &MockAiProvider, translator: &MockTranslator) -> QueryPipeline {
    let setup = TestSetup::new().await.expect("fixture database");
    QueryPipeline::builder()
        .storage(setup.storage())
        .schema(SchemaContext::new(TEST_SCHEMA))
        .translator(Box::new(translator.clone()))
        .sql_generation(Task::new(
            Box::new(ai.clone()),
            PromptTemplate::sql_generation(),
        ))
        .build()
        .expect("pipeline")
}
