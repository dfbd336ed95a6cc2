use std::fmt;
use thiserror::Error;

/// Custom error types for the library.
#[derive(Error, Debug)]
pub enum PromptError {
    #[error("Failed to build Reqwest client: {0}")]
    ReqwestClientBuild(reqwest::Error),
    #[error("Failed to send request to AI provider: {0}")]
    AiRequest(reqwest::Error),
    #[error("Failed to deserialize AI provider response: {0}")]
    AiDeserialization(reqwest::Error),
    #[error("AI provider returned an error: {0}")]
    AiApi(String),
    #[error("AI provider is not configured: {0}")]
    MissingAiProvider(String),
    #[error("Pipeline is missing a required component: {0}")]
    MissingComponent(String),
    #[error("Storage provider connection error: {0}")]
    StorageConnection(String),
    #[error("Storage query execution failed: {0}")]
    StorageOperationFailed(String),
    #[error("Translation failed: {0}")]
    Translation(String),
    #[error("Invalid prompt template: {0}")]
    InvalidTemplate(String),
    #[error("Failed to read schema description '{path}': {source}")]
    SchemaLoad {
        path: String,
        source: std::io::Error,
    },
    #[error("Failed to serialize result: {0}")]
    JsonSerialization(#[from] serde_json::Error),
}

/// The step of the question-answering pipeline that produced an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Translation,
    SqlGeneration,
    Summarization,
    Forecasting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Translation => "Translation",
            Stage::SqlGeneration => "SQL generation",
            Stage::Summarization => "LLM summarization",
            Stage::Forecasting => "LLM forecasting",
        };
        f.write_str(name)
    }
}

/// A pipeline failure, tagged with the stage that failed and the generated SQL
/// when one was already available.
#[derive(Error, Debug)]
#[error("{stage} failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    pub sql: Option<String>,
    #[source]
    pub source: PromptError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: PromptError) -> Self {
        Self {
            stage,
            sql: None,
            source,
        }
    }

    pub fn with_sql(mut self, sql: impl Into<String>) -> Self {
        self.sql = Some(sql.into());
        self
    }
}
