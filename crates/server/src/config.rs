//! # Application Configuration
//!
//! This module defines the configuration structure for the `aquifer-server` and
//! provides the logic for loading it from a `config.yml` file and environment
//! variables.

use aquifer::constants::DEFAULT_SCHEMA_PATH;
use aquifer::dashboards::default_dashboards;
use aquifer::prompts::tasks::*;
use aquifer::providers::translation::TranslationSettings;
use aquifer::DashboardQuery;
use config::{
    Config as ConfigBuilder, Environment, File, FileFormat, Value as ConfigValue,
    ValueKind as ConfigValueKind,
};
use regex::Regex;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::sync::LazyLock;
use tracing::info;

/// The task names the pipeline is built from.
pub const SQL_GENERATION_TASK: &str = "sql_generation";
pub const ANSWER_SUMMARY_TASK: &str = "answer_summary";
pub const FORECAST_TASK: &str = "forecast";

/// The provider every default task uses unless `config.yml` says otherwise.
pub const DEFAULT_PROVIDER: &str = "gemini_default";

static ENV_PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{(?P<var>[A-Z0-9_]+)\}").expect("placeholder pattern is valid")
});

/// A custom error type for configuration issues.
#[derive(Debug)]
pub enum ConfigError {
    /// Indicates an error from the underlying `config` crate.
    General(String),
    /// Indicates a required configuration file was not found.
    NotFound(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::General(msg) => write!(f, "Configuration error: {msg}"),
            ConfigError::NotFound(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::General(err.to_string())
    }
}

/// The root configuration structure, mapping directly to `config.yml`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// The port for the server to listen on. Loaded from `PORT` env var.
    #[serde(default = "default_port")]
    pub port: u16,
    /// The JSON schema description given to the model. Loaded from `SCHEMA_PATH`.
    #[serde(default = "default_schema_path")]
    pub schema_path: String,
    /// The database holding `attribute_data`.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// A map of named, reusable AI provider configurations.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    /// A map of tasks, each specifying a provider and prompts.
    pub tasks: HashMap<String, TaskConfig>,
    /// The translation service used for non-English questions.
    #[serde(default)]
    pub translation: TranslationSettings,
    /// Fixed statements served at `/dashboard/{name}`.
    #[serde(default)]
    pub dashboards: HashMap<String, DashboardQuery>,
}

fn default_port() -> u16 {
    8000
}

fn default_schema_path() -> String {
    DEFAULT_SCHEMA_PATH.to_string()
}

/// Which storage provider serves queries.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Postgres,
    Sqlite,
}

/// Connection settings. `path` is used by the SQLite backend, the rest by
/// PostgreSQL.
#[derive(Deserialize, Clone)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: DatabaseBackend,
    #[serde(default = "default_db_host")]
    pub host: String,
    #[serde(default = "default_db_port")]
    pub port: u16,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub user: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub path: Option<String>,
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::default(),
            host: default_db_host(),
            port: default_db_port(),
            name: String::new(),
            user: String::new(),
            password: String::new(),
            path: None,
        }
    }
}

impl std::fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("backend", &self.backend)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("name", &self.name)
            .field("user", &self.user)
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

/// A reusable configuration for a specific AI provider instance.
#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// The type of provider (e.g., "gemini", "local").
    pub provider: String,
    /// The API URL. Optional for providers like Gemini where it can be derived.
    #[serde(default)]
    pub api_url: Option<String>,
    /// The API key, which can be null for local providers.
    #[serde(default)]
    pub api_key: Option<String>,
    pub model_name: String,
}

/// Defines the prompts and provider for a specific application task.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct TaskConfig {
    /// The key of the provider to use from the `providers` map.
    #[serde(default)]
    pub provider: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub user_prompt: Option<String>,
}

fn table(entries: Vec<(&str, ConfigValue)>) -> ConfigValue {
    let map = entries
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect::<HashMap<_, _>>();
    ConfigValue::new(None, ConfigValueKind::Table(map))
}

/// Constructs a `config::Value` map of the default, hardcoded tasks from the library.
/// This serves as the base layer of configuration.
fn build_default_tasks() -> HashMap<String, ConfigValue> {
    [
        (
            SQL_GENERATION_TASK,
            SQL_GENERATION_SYSTEM_PROMPT,
            SQL_GENERATION_USER_PROMPT,
        ),
        (
            ANSWER_SUMMARY_TASK,
            ANSWER_SUMMARY_SYSTEM_PROMPT,
            ANSWER_SUMMARY_USER_PROMPT,
        ),
        (FORECAST_TASK, FORECAST_SYSTEM_PROMPT, FORECAST_USER_PROMPT),
    ]
    .into_iter()
    .map(|(name, sys, user)| {
        (
            name.to_string(),
            table(vec![
                ("provider", ConfigValue::from(DEFAULT_PROVIDER)),
                ("system_prompt", ConfigValue::from(sys)),
                ("user_prompt", ConfigValue::from(user)),
            ]),
        )
    })
    .collect()
}

/// The built-in dashboards as a `config::Value` map.
fn build_default_dashboards() -> HashMap<String, ConfigValue> {
    default_dashboards()
        .into_iter()
        .map(|(name, query)| {
            let zero_fill = query
                .zero_fill
                .into_iter()
                .map(ConfigValue::from)
                .collect::<Vec<_>>();
            (
                name.to_string(),
                table(vec![
                    ("sql", ConfigValue::from(query.sql)),
                    (
                        "zero_fill",
                        ConfigValue::new(None, ConfigValueKind::Array(zero_fill)),
                    ),
                ]),
            )
        })
        .collect()
}

// Helper to read a file, substitute env vars, and return its content.
// Returns Ok(None) if the file does not exist, or an error if it fails to read.
fn read_and_substitute(path: &str) -> Result<Option<String>, ConfigError> {
    if !std::path::Path::new(path).exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path)
        .map_err(|e| ConfigError::General(format!("Failed to read config file '{path}': {e}")))?;

    let expanded_content = ENV_PLACEHOLDER.replace_all(&content, |caps: &regex::Captures| {
        let var_name = &caps["var"];
        env::var(var_name).unwrap_or_default()
    });

    Ok(Some(expanded_content.to_string()))
}

/// Reads a non-empty environment variable.
fn non_empty_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

/// Applies the conventional `DB_*` and `GEMINI_API_KEY` variables on top of
/// the resolved configuration.
fn apply_env_overrides(config: &mut AppConfig) -> Result<(), ConfigError> {
    let db = &mut config.database;
    if let Some(host) = non_empty_var("DB_HOST") {
        db.host = host;
    }
    if let Some(port) = non_empty_var("DB_PORT") {
        db.port = port
            .trim()
            .parse()
            .map_err(|e| ConfigError::General(format!("DB_PORT '{port}' is not a port: {e}")))?;
    }
    if let Some(name) = non_empty_var("DB_NAME") {
        db.name = name;
    }
    if let Some(user) = non_empty_var("DB_USER") {
        db.user = user;
    }
    if let Some(password) = non_empty_var("DB_PASSWORD") {
        db.password = password;
    }

    // A Gemini provider without a key picks up GEMINI_API_KEY.
    if let Some(key) = non_empty_var("GEMINI_API_KEY") {
        for provider in config.providers.values_mut() {
            let missing = provider
                .api_key
                .as_deref()
                .map_or(true, |k| k.trim().is_empty());
            if provider.provider == "gemini" && missing {
                provider.api_key = Some(key.clone());
            }
        }
    }
    Ok(())
}

/// Loads the application configuration from a file and environment variables.
///
/// Layers, lowest precedence first:
/// 1. the default task prompts and dashboard statements from the library;
/// 2. `config.yml` (or an explicit path), falling back to `config.{AI_PROVIDER}.yml`,
///    with `${VAR}` placeholders substituted from the environment;
/// 3. top-level keys like `port` from `PORT`;
/// 4. nested keys from `AQUIFER_...` variables (e.g. `AQUIFER_DATABASE__BACKEND`);
/// 5. `DB_HOST`, `DB_PORT`, `DB_NAME`, `DB_USER`, `DB_PASSWORD`, `GEMINI_API_KEY`.
pub fn get_config(config_path_override: Option<&str>) -> Result<AppConfig, ConfigError> {
    let base_path = env!("CARGO_MANIFEST_DIR");
    let mut builder = ConfigBuilder::builder()
        // Layer 1: Programmatic defaults from the library.
        .set_default("tasks", build_default_tasks())?
        .set_default("dashboards", build_default_dashboards())?;

    // Layer 2: Main Config (with Fallback)
    let main_config_path = if let Some(override_path) = config_path_override {
        override_path.to_string()
    } else {
        let user_config_path = format!("{base_path}/config.yml");
        if std::path::Path::new(&user_config_path).exists() {
            info!("Loading user-defined configuration from '{user_config_path}'.");
            user_config_path
        } else {
            let provider = env::var("AI_PROVIDER").unwrap_or_else(|_| "gemini".to_string());
            let fallback_path = format!("{base_path}/config.{provider}.yml");
            info!("'{user_config_path}' not found. Falling back to '{fallback_path}' based on AI_PROVIDER='{provider}'.");
            fallback_path
        }
    };

    let main_content = read_and_substitute(&main_config_path)?
        .ok_or_else(|| ConfigError::NotFound(format!("Main config file not found at '{main_config_path}'. Please ensure 'config.yml' exists or your AI_PROVIDER is set to load a valid template ('gemini' or 'local').")))?;
    builder = builder.add_source(File::from_str(&main_content, FileFormat::Yaml));

    let settings = builder
        // Layer 3: Load environment variables for top-level keys like PORT.
        .add_source(Environment::default())
        // Layer 4: Load prefixed environment variables for deeper overrides.
        .add_source(
            Environment::with_prefix("AQUIFER")
                .prefix_separator("_")
                .try_parsing(true)
                .separator("__"),
        )
        .build()?;

    let mut config: AppConfig = settings.try_deserialize()?;

    // Layer 5: The variables a plain `.env` for this service sets.
    apply_env_overrides(&mut config)?;

    Ok(config)
}
