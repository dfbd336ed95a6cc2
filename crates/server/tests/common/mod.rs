//! # Common Test Utilities
//!
//! This module centralizes the test harness used across the `aquifer-server`
//! integration tests.
//!
//! - `TestApp`: spawns the real router on a random port, backed by an on-disk
//!   SQLite copy of the groundwater fixture, with every model and translation
//!   call served by an `httpmock::MockServer`.
//! - Helpers for programming the mock model.

// Allow unused code because this is a test utility module, and not all
// functions might be used by every test file that includes it.
#![allow(unused)]

use anyhow::Result;
use aquifer_server::{
    config, router,
    state::{build_app_state, AppState},
};
use aquifer_test_utils::TestSetup;
use axum::serve;
use httpmock::{Method, Mock, MockServer};
use reqwest::Client;
use serde_json::json;
use std::{fs, net::SocketAddr, path::PathBuf};
use tempfile::{tempdir, TempDir};
use tokio::{net::TcpListener, task::JoinHandle};

/// Substrings of the default system prompts, one per model task.
pub const SQL_KEY: &str = "SQL generator";
pub const SUMMARY_KEY: &str = "helpful assistant";
pub const FORECAST_KEY: &str = "data scientist";

pub const CHAT_PATH: &str = "/v1/chat/completions";
pub const TRANSLATE_PATH: &str = "/translate";

const TEST_SCHEMA: &str = r#"{"attribute_data": {"state": "text", "district": "text", "year": "text", "categorization": "text"}}"#;

/// SQLite renditions of two of the built-in dashboards.
const PIE_SQL: &str = "SELECT state, categorization, COUNT(*) AS count FROM attribute_data WHERE categorization IS NOT NULL GROUP BY state, categorization ORDER BY count DESC, state, categorization";
const BAR_SQL: &str = "SELECT assessment_unit_name AS block, state, stage_of_ground_water_extraction_pct FROM attribute_data ORDER BY stage_of_ground_water_extraction_pct DESC";

/// A harness for end-to-end testing of the Axum server.
pub struct TestApp {
    pub address: String,
    pub client: Client,
    pub mock_server: MockServer,
    pub db_path: PathBuf,
    pub app_state: AppState,
    _dir: TempDir,
    _server_handle: JoinHandle<()>,
    shutdown_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl TestApp {
    /// Spawns the application server and returns a `TestApp` instance.
    pub async fn spawn() -> Result<Self> {
        let _ = tracing_subscriber_init();

        let mock_server = MockServer::start();
        let dir = tempdir()?;
        let db_path = dir.path().join("groundwater.db");
        let schema_path = dir.path().join("database_schema.json");
        let config_path = dir.path().join("config.yml");

        // Seed the fixture and release the handle before the server opens the file.
        {
            TestSetup::at(db_path.to_str().unwrap()).await?;
        }
        fs::write(&schema_path, TEST_SCHEMA)?;

        let config_content = format!(
            r#"
port: 0
schema_path: "{schema}"
database:
  backend: sqlite
  path: "{db}"
providers:
  gemini_default:
    provider: "local"
    api_url: "{chat}"
    api_key: null
    model_name: "mock-chat-model"
translation:
  provider: indictrans2
  api_url: "{translate}"
dashboards:
  pie:
    sql: "{pie}"
  bar:
    sql: "{bar}"
"#,
            schema = schema_path.to_str().unwrap(),
            db = db_path.to_str().unwrap(),
            chat = mock_server.url(CHAT_PATH),
            translate = mock_server.url(TRANSLATE_PATH),
            pie = PIE_SQL,
            bar = BAR_SQL,
        );
        fs::write(&config_path, config_content)?;

        let config = config::get_config(Some(config_path.to_str().unwrap()))?;
        let app_state = build_app_state(config).await?;

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr: SocketAddr = listener.local_addr()?;
        let address = format!("http://{addr}");

        let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();
        let state_for_server = app_state.clone();
        let server_handle = tokio::spawn(async move {
            let app = router::create_router(state_for_server);
            let server = serve(listener, app).with_graceful_shutdown(async {
                shutdown_rx.await.ok();
            });
            if let Err(e) = server.await {
                eprintln!("[TestApp] Server error: {e}");
            }
        });

        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Ok(Self {
            address,
            client: Client::new(),
            mock_server,
            db_path,
            app_state,
            _dir: dir,
            _server_handle: server_handle,
            shutdown_tx: Some(shutdown_tx),
        })
    }

    /// Answers every chat request whose body contains `key` with `content`.
    pub fn mock_chat<'a>(&'a self, key: &str, content: &str) -> Mock<'a> {
        let body = chat_response(content);
        self.mock_server.mock(|when, then| {
            when.method(Method::POST)
                .path(CHAT_PATH)
                .body_contains(key);
            then.status(200).json_body(body);
        })
    }

    /// Fails every chat request whose body contains `key`.
    pub fn mock_chat_failure<'a>(&'a self, key: &str, status: u16) -> Mock<'a> {
        self.mock_server.mock(|when, then| {
            when.method(Method::POST)
                .path(CHAT_PATH)
                .body_contains(key);
            then.status(status).body("model unavailable");
        })
    }

    pub async fn post_json(&self, path: &str, body: serde_json::Value) -> reqwest::Response {
        self.client
            .post(format!("{}{path}", self.address))
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request.")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(format!("{}{path}", self.address))
            .send()
            .await
            .expect("Failed to execute request.")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// The body an OpenAI-compatible server returns for one completion.
pub fn chat_response(content: &str) -> serde_json::Value {
    json!({
        "choices": [{"message": {"role": "assistant", "content": content}}]
    })
}

fn tracing_subscriber_init() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .compact()
        .with_test_writer()
        .try_init()
}
