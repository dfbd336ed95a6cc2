//! # Ask and SQL Commands
//!
//! Builds a SQL-generation-only pipeline from command-line arguments and runs
//! questions through it, printing the generated statement and the first rows
//! of its result.

use anyhow::{bail, Result};
use aquifer::{
    constants::{DEFAULT_SCHEMA_PATH, SAMPLE_QUESTIONS, SUMMARY_ROW_LIMIT},
    providers::{
        ai::{
            gemini::{gemini_api_url, GeminiProvider, DEFAULT_GEMINI_MODEL},
            local::LocalAiProvider,
            AiProvider,
        },
        db::{
            postgres::{PostgresProvider, PostgresSettings},
            sqlite::SqliteProvider,
            storage::Storage,
        },
    },
    sanitize::sanitize_value,
    PromptTemplate, QueryOutput, QueryPipeline, SchemaContext, Task,
};
use clap::{Parser, ValueEnum};
use serde_json::Value;
use std::io::Write;
use std::sync::Arc;
use tracing::info;

/// The model backend used for SQL generation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum AiBackend {
    Gemini,
    Local,
}

/// Arguments shared by every command that generates SQL.
#[derive(Parser, Debug)]
pub struct PipelineArgs {
    /// Query a SQLite file instead of PostgreSQL
    #[arg(long)]
    sqlite: Option<String>,
    /// The JSON schema description given to the model
    #[arg(long, env = "SCHEMA_PATH", default_value = DEFAULT_SCHEMA_PATH)]
    schema: String,
    #[arg(long, env = "AI_PROVIDER", value_enum, default_value = "gemini")]
    ai_provider: AiBackend,
    /// Endpoint override. Required for the local provider
    #[arg(long, env = "AI_API_URL")]
    api_url: Option<String>,
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true)]
    gemini_api_key: Option<String>,
    #[arg(long, env = "AI_MODEL", default_value = DEFAULT_GEMINI_MODEL)]
    model: String,
    #[arg(long, env = "DB_HOST", default_value = "localhost")]
    db_host: String,
    #[arg(long, env = "DB_PORT", default_value_t = 5432)]
    db_port: u16,
    #[arg(long, env = "DB_NAME", default_value = "")]
    db_name: String,
    #[arg(long, env = "DB_USER", default_value = "")]
    db_user: String,
    #[arg(long, env = "DB_PASSWORD", default_value = "", hide_env_values = true)]
    db_password: String,
}

#[derive(Parser, Debug)]
pub struct AskArgs {
    /// Questions to ask. The built-in sample questions are used when none are given
    questions: Vec<String>,
    /// How many result rows to print per question
    #[arg(long, default_value_t = SUMMARY_ROW_LIMIT)]
    rows: usize,
    #[command(flatten)]
    pipeline: PipelineArgs,
}

#[derive(Parser, Debug)]
pub struct SqlArgs {
    /// The question to translate into SQL
    #[arg(required = true)]
    question: String,
    #[command(flatten)]
    pipeline: PipelineArgs,
}

impl PipelineArgs {
    fn ai_provider(&self) -> Result<Box<dyn AiProvider>> {
        let api_url = self.api_url.clone().filter(|url| !url.trim().is_empty());
        let provider: Box<dyn AiProvider> = match self.ai_provider {
            AiBackend::Gemini => {
                let Some(api_key) = self.gemini_api_key.clone() else {
                    bail!("GEMINI_API_KEY (or --gemini-api-key) is required for the gemini provider");
                };
                let api_url = api_url.unwrap_or_else(|| gemini_api_url(&self.model));
                Box::new(GeminiProvider::new(api_url, api_key)?)
            }
            AiBackend::Local => {
                let Some(api_url) = api_url else {
                    bail!("AI_API_URL (or --api-url) is required for the local provider");
                };
                Box::new(LocalAiProvider::new(
                    api_url,
                    self.gemini_api_key.clone(),
                    Some(self.model.clone()),
                )?)
            }
        };
        Ok(provider)
    }

    async fn storage(&self) -> Result<Arc<dyn Storage>> {
        let storage: Arc<dyn Storage> = match &self.sqlite {
            Some(path) => Arc::new(SqliteProvider::new(path).await?),
            None => Arc::new(PostgresProvider::new(PostgresSettings {
                host: self.db_host.clone(),
                port: self.db_port,
                dbname: self.db_name.clone(),
                user: self.db_user.clone(),
                password: self.db_password.clone(),
            })),
        };
        Ok(storage)
    }

    /// A pipeline that only generates SQL; answers are not summarized here.
    pub async fn build(&self) -> Result<QueryPipeline> {
        let pipeline = QueryPipeline::builder()
            .storage(self.storage().await?)
            .schema(SchemaContext::load(&self.schema)?)
            .sql_generation(Task::new(self.ai_provider()?, PromptTemplate::sql_generation()))
            .build()?;
        Ok(pipeline)
    }
}

/// Renders one sanitized row the way a tuple is printed.
pub fn format_row(values: impl IntoIterator<Item = Value>) -> String {
    let cells: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();
    format!("({})", cells.join(", "))
}

/// Prints the column header, the first `limit` rows and the elapsed time.
pub fn print_output(out: &mut impl Write, output: &QueryOutput, limit: usize) -> Result<()> {
    writeln!(out, "Retrieved data:")?;
    writeln!(
        out,
        "{}",
        format_row(output.columns.iter().cloned().map(Value::String))
    )?;
    for row in output.rows.iter().take(limit) {
        writeln!(out, "{}", format_row(row.iter().cloned().map(sanitize_value)))?;
    }
    writeln!(out, "Time-taken: {:.3} seconds", output.duration_secs())?;
    Ok(())
}

pub async fn handle_ask(args: &AskArgs) -> Result<()> {
    let pipeline = args.pipeline.build().await?;
    let questions: Vec<String> = if args.questions.is_empty() {
        SAMPLE_QUESTIONS.iter().map(|q| q.to_string()).collect()
    } else {
        args.questions.clone()
    };

    let mut stdout = std::io::stdout();
    for question in &questions {
        info!(question = %question, "Asking");
        writeln!(stdout, "\n{}", "=".repeat(60))?;
        writeln!(stdout, "Question: {question}")?;

        let sql = pipeline.generate_sql(question).await?;
        writeln!(stdout, "Generated SQL-Query:\n{sql}")?;

        match pipeline.storage().execute_query(&sql).await {
            Ok(output) => print_output(&mut stdout, &output, args.rows)?,
            Err(e) => writeln!(stdout, "Error executing query: {e}")?,
        }
    }
    Ok(())
}

pub async fn handle_sql(args: &SqlArgs) -> Result<()> {
    let pipeline = args.pipeline.build().await?;
    let sql = pipeline.generate_sql(&args.question).await?;
    println!("{sql}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use aquifer::SqlValue;
    use std::time::Duration;

    #[test]
    fn rows_are_printed_as_tuples_up_to_the_limit() {
        let output = QueryOutput {
            columns: vec!["state".to_string(), "rainfall".to_string()],
            rows: vec![
                vec![SqlValue::Text("TELANGANA".to_string()), SqlValue::Float(905.5)],
                vec![SqlValue::Text("PUNJAB".to_string()), SqlValue::Text("NaN".to_string())],
                vec![SqlValue::Text("GOA".to_string()), SqlValue::Null],
            ],
            duration: Duration::from_millis(1250),
        };

        let mut buf = Vec::new();
        print_output(&mut buf, &output, 2).unwrap();

        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "Retrieved data:\n(\"state\", \"rainfall\")\n(\"TELANGANA\", 905.5)\n(\"PUNJAB\", null)\nTime-taken: 1.250 seconds\n"
        );
    }

    #[test]
    fn repeated_columns_keep_every_cell() {
        let output = QueryOutput {
            columns: vec!["state".to_string(), "state".to_string()],
            rows: vec![vec![
                SqlValue::Text("GOA".to_string()),
                SqlValue::Text("GOA".to_string()),
            ]],
            duration: Duration::from_millis(5),
        };

        let mut buf = Vec::new();
        print_output(&mut buf, &output, 10).unwrap();

        let printed = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = printed.lines().collect();
        assert_eq!(lines[1], "(\"state\", \"state\")");
        assert_eq!(lines[2], "(\"GOA\", \"GOA\")");
    }
}
