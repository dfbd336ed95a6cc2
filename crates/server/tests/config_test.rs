//! # Configuration Tests
//!
//! Tests for the layered configuration loader. Environment variables are a
//! shared, global resource, so every test here runs serially.

use aquifer::prompts::tasks::{
    ANSWER_SUMMARY_SYSTEM_PROMPT, ANSWER_SUMMARY_USER_PROMPT, SQL_GENERATION_USER_PROMPT,
};
use aquifer::providers::translation::TranslationProviderKind;
use aquifer_server::config::{
    get_config, ConfigError, DatabaseBackend, ANSWER_SUMMARY_TASK, DEFAULT_PROVIDER,
    FORECAST_TASK, SQL_GENERATION_TASK,
};
use serial_test::serial;
use std::env;
use std::fs;
use tempfile::TempDir;

const VARS: [&str; 9] = [
    "PORT",
    "DB_HOST",
    "DB_PORT",
    "DB_NAME",
    "DB_USER",
    "DB_PASSWORD",
    "GEMINI_API_KEY",
    "AQUIFER_DATABASE__BACKEND",
    "TEST_TRANSLATE_KEY",
];

/// Clears every variable the loader reads so each test starts from a clean slate.
fn clear_env_vars() {
    for var in VARS {
        env::remove_var(var);
    }
}

/// Writes `content` to a `config.yml` in a fresh temp dir.
fn write_config(content: &str) -> (TempDir, String) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.yml");
    fs::write(&path, content).unwrap();
    let path = path.to_str().unwrap().to_string();
    (dir, path)
}

const MINIMAL: &str = r#"
providers:
  gemini_default:
    provider: "gemini"
    api_key: "file-key"
    model_name: "gemini-1.5-flash-latest"
"#;

#[test]
#[serial]
fn test_defaults_fill_everything_the_file_omits() {
    clear_env_vars();
    let (_dir, path) = write_config(MINIMAL);

    let config = get_config(Some(&path)).unwrap();

    assert_eq!(config.port, 8000);
    assert_eq!(config.schema_path, "database_schema.json");
    assert_eq!(config.database.backend, DatabaseBackend::Postgres);
    assert_eq!(config.database.host, "localhost");
    assert_eq!(config.database.port, 5432);
    assert_eq!(config.translation.provider, TranslationProviderKind::Google);

    for task in [SQL_GENERATION_TASK, ANSWER_SUMMARY_TASK, FORECAST_TASK] {
        let task = &config.tasks[task];
        assert_eq!(task.provider.as_deref(), Some(DEFAULT_PROVIDER));
        assert!(task.system_prompt.is_some());
        assert!(task.user_prompt.is_some());
    }
    assert_eq!(
        config.tasks[SQL_GENERATION_TASK].user_prompt.as_deref(),
        Some(SQL_GENERATION_USER_PROMPT)
    );

    let mut names: Vec<_> = config.dashboards.keys().cloned().collect();
    names.sort();
    assert_eq!(names, ["bar", "map", "pie", "trend"]);
    assert_eq!(
        config.dashboards["bar"].zero_fill,
        ["stage_of_ground_water_extraction_pct"]
    );
}

#[test]
#[serial]
fn test_task_override_keeps_the_other_defaults() {
    clear_env_vars();
    let (_dir, path) = write_config(&format!(
        "{MINIMAL}\ntasks:\n  answer_summary:\n    system_prompt: \"Answer in one sentence.\"\n"
    ));

    let config = get_config(Some(&path)).unwrap();
    let summary = &config.tasks[ANSWER_SUMMARY_TASK];

    assert_eq!(
        summary.system_prompt.as_deref(),
        Some("Answer in one sentence.")
    );
    assert_ne!(
        summary.system_prompt.as_deref(),
        Some(ANSWER_SUMMARY_SYSTEM_PROMPT)
    );
    assert_eq!(
        summary.user_prompt.as_deref(),
        Some(ANSWER_SUMMARY_USER_PROMPT)
    );
    assert_eq!(summary.provider.as_deref(), Some(DEFAULT_PROVIDER));
}

#[test]
#[serial]
fn test_placeholders_are_substituted_from_the_environment() {
    clear_env_vars();
    env::set_var("TEST_TRANSLATE_KEY", "translate-secret");
    let (_dir, path) = write_config(&format!(
        "{MINIMAL}\ntranslation:\n  provider: google\n  api_key: \"${{TEST_TRANSLATE_KEY}}\"\n"
    ));

    let config = get_config(Some(&path)).unwrap();

    assert_eq!(
        config.translation.api_key.as_deref(),
        Some("translate-secret")
    );
    clear_env_vars();
}

#[test]
#[serial]
fn test_db_variables_override_the_file() {
    clear_env_vars();
    env::set_var("DB_HOST", "db.internal");
    env::set_var("DB_PORT", "6543");
    env::set_var("DB_NAME", "groundwater");
    env::set_var("DB_USER", "reader");
    env::set_var("DB_PASSWORD", "hunter2");
    let (_dir, path) = write_config(&format!(
        "{MINIMAL}\ndatabase:\n  host: \"file-host\"\n  name: \"file-db\"\n"
    ));

    let config = get_config(Some(&path)).unwrap();

    assert_eq!(config.database.host, "db.internal");
    assert_eq!(config.database.port, 6543);
    assert_eq!(config.database.name, "groundwater");
    assert_eq!(config.database.user, "reader");
    assert_eq!(config.database.password, "hunter2");
    assert!(!format!("{:?}", config.database).contains("hunter2"));
    clear_env_vars();
}

#[test]
#[serial]
fn test_invalid_db_port_is_an_error() {
    clear_env_vars();
    env::set_var("DB_PORT", "not-a-port");
    let (_dir, path) = write_config(MINIMAL);

    let result = get_config(Some(&path));

    assert!(matches!(result, Err(ConfigError::General(msg)) if msg.contains("DB_PORT")));
    clear_env_vars();
}

#[test]
#[serial]
fn test_gemini_key_fills_an_empty_provider_key() {
    clear_env_vars();
    env::set_var("GEMINI_API_KEY", "env-key");
    let (_dir, path) = write_config(
        r#"
providers:
  gemini_default:
    provider: "gemini"
    api_key: "${UNSET_GEMINI_KEY_FOR_TEST}"
    model_name: "gemini-1.5-flash-latest"
  pinned:
    provider: "gemini"
    api_key: "pinned-key"
    model_name: "gemini-1.5-pro-latest"
"#,
    );

    let config = get_config(Some(&path)).unwrap();

    assert_eq!(
        config.providers["gemini_default"].api_key.as_deref(),
        Some("env-key")
    );
    assert_eq!(
        config.providers["pinned"].api_key.as_deref(),
        Some("pinned-key")
    );
    clear_env_vars();
}

#[test]
#[serial]
fn test_prefixed_variables_override_nested_keys() {
    clear_env_vars();
    env::set_var("AQUIFER_DATABASE__BACKEND", "sqlite");
    env::set_var("PORT", "9090");
    let (_dir, path) = write_config(MINIMAL);

    let config = get_config(Some(&path)).unwrap();

    assert_eq!(config.database.backend, DatabaseBackend::Sqlite);
    assert_eq!(config.port, 9090);
    clear_env_vars();
}

#[test]
#[serial]
fn test_missing_config_file_is_not_found() {
    clear_env_vars();
    let result = get_config(Some("/nonexistent/aquifer/config.yml"));
    assert!(matches!(result, Err(ConfigError::NotFound(_))));
}
