use anyhow::Result;
use aquifer::errors::PromptError;
use aquifer::providers::ai::AiProvider;
use aquifer::providers::db::{sqlite::SqliteProvider, storage::Storage};
use aquifer::providers::translation::Translator;
use aquifer::types::QueryOutput;
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::{Arc, Mutex};

// --- Groundwater Fixture ---

/// A small slice of the groundwater assessment table. Numeric columns are
/// stored as text, as in the published dataset, and include `NaN` sentinels.
pub const GROUNDWATER_FIXTURE_SQL: &str = "
    CREATE TABLE attribute_data (
        state TEXT,
        district TEXT,
        assessment_unit_name TEXT,
        year TEXT,
        categorization TEXT,
        total_annual_ground_water_recharge_ham TEXT,
        total_extraction_ham TEXT,
        stage_of_ground_water_extraction_pct REAL
    );
    INSERT INTO attribute_data VALUES ('TELANGANA', 'ADILABAD', 'Adilabad', '2019', 'safe', '1250.5', '400.25', 32.0);
    INSERT INTO attribute_data VALUES ('TELANGANA', 'ADILABAD', 'Bela', '2020', 'semi_critical', '980.0', '760.0', 77.5);
    INSERT INTO attribute_data VALUES ('TELANGANA', 'JAYASHANKAR BHUPALAPALLY', 'Mulug', '2019', 'safe', '1500.0', '300.0', 20.0);
    INSERT INTO attribute_data VALUES ('PUNJAB', 'LUDHIANA', 'Doraha', '2020', 'over_exploited', '850.0', 'NaN', NULL);
    INSERT INTO attribute_data VALUES ('PUNJAB', 'LUDHIANA', 'Khanna', '2021', 'over_exploited', 'NaN', '1400.0', 164.7);
    INSERT INTO attribute_data VALUES ('ANDAMAN AND NICOBAR ISLANDS', 'SOUTH ANDAMAN', 'Port Blair', '2016', NULL, '45.5', '2.0', 4.4)
";

/// A helper struct that owns an isolated in-memory SQLite database seeded
/// with [`GROUNDWATER_FIXTURE_SQL`].
pub struct TestSetup {
    pub provider: SqliteProvider,
}

impl TestSetup {
    pub async fn new() -> Result<Self> {
        Self::at(":memory:").await
    }

    /// Creates (or opens) the fixture at `path`, e.g. a file in a temp dir.
    pub async fn at(path: &str) -> Result<Self> {
        let provider = SqliteProvider::new(path).await?;
        provider.initialize_with_data(GROUNDWATER_FIXTURE_SQL).await?;
        Ok(Self { provider })
    }

    pub fn storage(&self) -> Arc<dyn Storage> {
        Arc::new(self.provider.clone())
    }
}

// --- Mock AI Provider ---

#[derive(Clone, Debug)]
pub struct MockAiProvider {
    responses: Arc<Mutex<HashMap<String, Result<String, String>>>>,
    calls: Arc<Mutex<Vec<(String, String)>>>,
}

impl MockAiProvider {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Pre-programs a response for a specific prompt.
    /// The key should be a unique substring of the system prompt.
    pub fn add_response(&self, key: &str, response: &str) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(key.to_string(), Ok(response.to_string()));
    }

    /// Makes calls whose system prompt contains `key` fail with an API error.
    pub fn add_failure(&self, key: &str, message: &str) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(key.to_string(), Err(message.to_string()));
    }

    /// Retrieves the recorded calls for assertion.
    pub fn get_calls(&self) -> Vec<(String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

impl Default for MockAiProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AiProvider for MockAiProvider {
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, PromptError> {
        let mut calls = self.calls.lock().unwrap();
        calls.push((system_prompt.to_string(), user_prompt.to_string()));

        let responses = self.responses.lock().unwrap();
        for (key, response) in responses.iter() {
            if system_prompt.contains(key) {
                return response.clone().map_err(PromptError::AiApi);
            }
        }

        Err(PromptError::AiApi(format!(
            "MockAiProvider: No response programmed for system prompt. Got: '{system_prompt}'"
        )))
    }
}

// --- Mock Storage ---

/// A storage provider whose every statement fails.
#[derive(Clone, Debug, Default)]
pub struct FailingStorage;

#[async_trait]
impl Storage for FailingStorage {
    fn name(&self) -> &str {
        "FailingDB"
    }

    async fn execute_query(&self, _sql: &str) -> Result<QueryOutput, PromptError> {
        Err(PromptError::StorageOperationFailed(
            "relation \"attribute_data\" does not exist".to_string(),
        ))
    }
}

// --- Mock Translator ---

/// A translator that tags text with its language pair, e.g. `[hi->en] text`,
/// and records every call.
#[derive(Clone, Debug, Default)]
pub struct MockTranslator {
    calls: Arc<Mutex<Vec<(String, String, String)>>>,
    fail: bool,
}

impl MockTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A translator whose every call fails.
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    /// Recorded `(text, source, target)` triples.
    pub fn get_calls(&self) -> Vec<(String, String, String)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Translator for MockTranslator {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, PromptError> {
        self.calls.lock().unwrap().push((
            text.to_string(),
            source_lang.to_string(),
            target_lang.to_string(),
        ));
        if self.fail {
            return Err(PromptError::Translation("service unavailable".to_string()));
        }
        Ok(format!("[{source_lang}->{target_lang}] {text}"))
    }
}
