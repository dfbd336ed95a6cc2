//! # Application State
//!
//! This module defines the shared application state (`AppState`) and the logic
//! for building it at startup. The `AppState` holds the question-answering
//! pipeline and the dashboard statements, making them accessible to all
//! request handlers.

use crate::config::{
    AppConfig, DatabaseBackend, DatabaseConfig, ANSWER_SUMMARY_TASK, FORECAST_TASK,
    SQL_GENERATION_TASK,
};
use aquifer::{
    providers::{
        ai::{
            gemini::{gemini_api_url, GeminiProvider},
            local::LocalAiProvider,
            AiProvider,
        },
        db::{
            postgres::{PostgresProvider, PostgresSettings},
            sqlite::SqliteProvider,
            storage::Storage,
        },
        translation::create_translator,
    },
    DashboardQuery, PromptTemplate, QueryPipeline, SchemaContext, Task,
};
use std::{collections::HashMap, sync::Arc};
use tracing::info;

/// The shared application state, accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Translation, SQL generation, execution and summarization.
    pub pipeline: Arc<QueryPipeline>,
    /// Fixed statements keyed by the name served at `/dashboard/{name}`.
    pub dashboards: Arc<HashMap<String, DashboardQuery>>,
}

/// Instantiates one AI provider client per entry in the `providers` section.
fn build_ai_providers(config: &AppConfig) -> anyhow::Result<HashMap<String, Box<dyn AiProvider>>> {
    let mut ai_providers = HashMap::new();
    for (name, provider_config) in &config.providers {
        let provider: Box<dyn AiProvider> = match provider_config.provider.as_str() {
            "gemini" => {
                let api_key = provider_config.api_key.clone().ok_or_else(|| {
                    anyhow::anyhow!("api_key is required for gemini provider '{name}'")
                })?;
                // If api_url is not provided in config, construct it from the model name.
                let api_url = provider_config
                    .api_url
                    .clone()
                    .filter(|url| !url.trim().is_empty())
                    .unwrap_or_else(|| gemini_api_url(&provider_config.model_name));
                Box::new(GeminiProvider::new(api_url, api_key)?)
            }
            "local" => {
                let api_url = provider_config
                    .api_url
                    .clone()
                    .filter(|url| !url.trim().is_empty())
                    .ok_or_else(|| {
                        anyhow::anyhow!(
                            "api_url is required for local provider '{name}'. Please set LOCAL_AI_API_URL in your .env file."
                        )
                    })?;
                Box::new(LocalAiProvider::new(
                    api_url,
                    provider_config.api_key.clone(),
                    Some(provider_config.model_name.clone()),
                )?)
            }
            _ => {
                return Err(anyhow::anyhow!(
                    "Unsupported AI provider type '{}' for provider '{}'",
                    provider_config.provider,
                    name
                ));
            }
        };
        ai_providers.insert(name.clone(), provider);
    }
    Ok(ai_providers)
}

/// Pairs a configured task with its provider and prompts.
fn resolve_task(
    config: &AppConfig,
    providers: &HashMap<String, Box<dyn AiProvider>>,
    name: &str,
) -> anyhow::Result<Task> {
    let task_config = config
        .tasks
        .get(name)
        .ok_or_else(|| anyhow::anyhow!("Task '{name}' is not configured"))?;
    let provider_name = task_config.provider.as_deref().ok_or_else(|| {
        anyhow::anyhow!("Resolved task '{name}' is missing required 'provider' field")
    })?;
    let system_prompt = task_config.system_prompt.clone().ok_or_else(|| {
        anyhow::anyhow!("Resolved task '{name}' is missing required 'system_prompt' field")
    })?;
    let user_prompt = task_config.user_prompt.clone().ok_or_else(|| {
        anyhow::anyhow!("Resolved task '{name}' is missing required 'user_prompt' field")
    })?;
    let provider = providers.get(provider_name).cloned().ok_or_else(|| {
        anyhow::anyhow!("Task '{name}' refers to unknown provider '{provider_name}'")
    })?;

    Ok(Task::new(
        provider,
        PromptTemplate::new(system_prompt, user_prompt),
    ))
}

/// Opens the storage provider selected by `database.backend`.
pub async fn build_storage(db: &DatabaseConfig) -> anyhow::Result<Arc<dyn Storage>> {
    let storage: Arc<dyn Storage> = match db.backend {
        DatabaseBackend::Postgres => {
            info!(host = %db.host, port = db.port, dbname = %db.name, "Using PostgreSQL storage.");
            Arc::new(PostgresProvider::new(PostgresSettings {
                host: db.host.clone(),
                port: db.port,
                dbname: db.name.clone(),
                user: db.user.clone(),
                password: db.password.clone(),
            }))
        }
        DatabaseBackend::Sqlite => {
            let path = db
                .path
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("database.path is required for the sqlite backend"))?;
            info!(db_path = %path, "Using SQLite storage.");
            Arc::new(SqliteProvider::new(path).await?)
        }
    };
    Ok(storage)
}

/// Builds the shared application state from the configuration.
///
/// This function initializes all necessary services:
/// - an AI provider client for each entry in the `providers` section;
/// - the storage provider for `attribute_data`;
/// - the translator and the schema description;
/// - the pipeline, which rejects a SQL generation template that does not
///   embed the schema and the question exactly once.
pub async fn build_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let providers = build_ai_providers(&config)?;
    let sql_generation = resolve_task(&config, &providers, SQL_GENERATION_TASK)?;
    let answer_summary = resolve_task(&config, &providers, ANSWER_SUMMARY_TASK)?;
    let forecast = resolve_task(&config, &providers, FORECAST_TASK)?;

    let storage = build_storage(&config.database).await?;
    let schema = SchemaContext::load(&config.schema_path)?;
    let translator = create_translator(&config.translation).await?;

    let pipeline = QueryPipeline::builder()
        .storage(storage)
        .schema(schema)
        .translator(translator)
        .sql_generation(sql_generation)
        .answer_summary(answer_summary)
        .forecast(forecast)
        .build()?;

    info!(
        dashboards = config.dashboards.len(),
        translation = %config.translation.provider,
        "Application state initialized."
    );

    Ok(AppState {
        dashboards: Arc::new(config.dashboards),
        pipeline: Arc::new(pipeline),
    })
}
