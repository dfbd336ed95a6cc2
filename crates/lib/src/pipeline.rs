//! # Question-Answering Pipeline
//!
//! `QueryPipeline` holds every collaborator a request needs (storage, schema
//! description, translator and one AI task per model call) and exposes the
//! operations served by the HTTP endpoints and the CLI:
//!
//! - [`QueryPipeline::answer`]: translate → generate SQL → execute → sanitize →
//!   summarize → translate back.
//! - [`QueryPipeline::forecast`]: generate SQL for a time series → execute →
//!   ask the model for a structured forecast.
//! - [`QueryPipeline::dashboard`]: run a fixed aggregation statement.
//!
//! The pipeline holds no per-request state, so one instance can be shared by
//! concurrent requests.

use crate::{
    constants::{PIVOT_LANGUAGE, SUMMARY_ROW_LIMIT},
    errors::{PipelineError, PromptError, Stage},
    executor::execute_or_empty,
    forecast::parse_forecast,
    prompts::{
        build_sql_prompt, tasks::FORECAST_QUESTION_SUFFIX, validate_sql_template, PromptTemplate,
    },
    providers::{
        ai::AiProvider,
        db::storage::Storage,
        translation::{PassthroughTranslator, Translator},
    },
    sanitize::sanitize_rows,
    schema::SchemaContext,
    sql::extract_sql,
    types::{DashboardQuery, Forecast, ForecastAnswer, QueryAnswer, ResultTable, Row},
};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// An AI provider paired with the prompts for one kind of model call.
#[derive(Debug, Clone)]
pub struct Task {
    pub provider: Box<dyn AiProvider>,
    pub template: PromptTemplate,
}

impl Task {
    pub fn new(provider: Box<dyn AiProvider>, template: PromptTemplate) -> Self {
        Self { provider, template }
    }

    async fn run(&self, vars: &[(&str, &str)]) -> Result<String, PromptError> {
        let prompt = self.template.render(vars);
        debug!(system_prompt = %prompt.system, user_prompt = %prompt.user, "--> Sending prompts to AI Provider");
        let raw = self.provider.generate(&prompt.system, &prompt.user).await?;
        debug!("<-- Response from AI: {}", raw);
        Ok(raw)
    }
}

/// The configured question-answering pipeline.
#[derive(Debug, Clone)]
pub struct QueryPipeline {
    storage: Arc<dyn Storage>,
    schema: SchemaContext,
    translator: Box<dyn Translator>,
    sql_generation: Task,
    answer_summary: Task,
    forecast: Task,
}

/// A builder for [`QueryPipeline`].
///
/// Storage, schema and the SQL generation task are required. The summary and
/// forecast tasks default to the SQL generation provider with their default
/// prompts; the translator defaults to a passthrough.
#[derive(Default)]
pub struct QueryPipelineBuilder {
    storage: Option<Arc<dyn Storage>>,
    schema: Option<SchemaContext>,
    translator: Option<Box<dyn Translator>>,
    sql_generation: Option<Task>,
    answer_summary: Option<Task>,
    forecast: Option<Task>,
}

impl QueryPipelineBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    pub fn schema(mut self, schema: SchemaContext) -> Self {
        self.schema = Some(schema);
        self
    }

    pub fn translator(mut self, translator: Box<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn sql_generation(mut self, task: Task) -> Self {
        self.sql_generation = Some(task);
        self
    }

    pub fn answer_summary(mut self, task: Task) -> Self {
        self.answer_summary = Some(task);
        self
    }

    pub fn forecast(mut self, task: Task) -> Self {
        self.forecast = Some(task);
        self
    }

    /// Consumes the builder and returns the pipeline, or an error naming the
    /// first missing collaborator.
    pub fn build(self) -> Result<QueryPipeline, PromptError> {
        let storage = self
            .storage
            .ok_or_else(|| PromptError::MissingComponent("storage".to_string()))?;
        let schema = self
            .schema
            .ok_or_else(|| PromptError::MissingComponent("schema description".to_string()))?;
        let sql_generation = self.sql_generation.ok_or_else(|| {
            PromptError::MissingAiProvider("the SQL generation task is required".to_string())
        })?;
        validate_sql_template(&sql_generation.template.user)?;

        let answer_summary = self.answer_summary.unwrap_or_else(|| {
            Task::new(
                sql_generation.provider.clone(),
                PromptTemplate::answer_summary(),
            )
        });
        let forecast = self.forecast.unwrap_or_else(|| {
            Task::new(sql_generation.provider.clone(), PromptTemplate::forecast())
        });

        Ok(QueryPipeline {
            storage,
            schema,
            translator: self
                .translator
                .unwrap_or_else(|| Box::new(PassthroughTranslator)),
            sql_generation,
            answer_summary,
            forecast,
        })
    }
}

impl QueryPipeline {
    pub fn builder() -> QueryPipelineBuilder {
        QueryPipelineBuilder::new()
    }

    pub fn storage(&self) -> &dyn Storage {
        self.storage.as_ref()
    }

    /// Asks the model for a statement answering `question` and strips any
    /// code fences from the reply. One call, no retry.
    pub async fn generate_sql(&self, question: &str) -> Result<String, PromptError> {
        let prompt = build_sql_prompt(&self.sql_generation.template, &self.schema, question);
        debug!(user_prompt = %prompt.user, "--> Sending SQL generation prompt");
        let raw = self
            .sql_generation
            .provider
            .generate(&prompt.system, &prompt.user)
            .await?;
        let sql = extract_sql(&raw);
        if sql.is_empty() {
            return Err(PromptError::AiApi(
                "the model reply contained no SQL statement".to_string(),
            ));
        }
        info!(sql = %sql, "Generated SQL");
        Ok(sql)
    }

    /// Summarizes the first rows of `table` in natural language.
    pub async fn summarize(&self, sql: &str, table: &[Row]) -> Result<String, PromptError> {
        let head = &table[..table.len().min(SUMMARY_ROW_LIMIT)];
        let results = serde_json::to_string_pretty(head)?;
        let answer = self
            .answer_summary
            .run(&[("sql", sql), ("results", &results)])
            .await?;
        Ok(answer.trim().to_string())
    }

    /// Asks the model for a forecast over the full `table`.
    ///
    /// A model call failure is an error. A reply without usable JSON is not:
    /// it yields a [`Forecast`] with no data and an explanatory reason.
    pub async fn compose_forecast(
        &self,
        question: &str,
        sql: &str,
        table: &[Row],
    ) -> Result<Forecast, PromptError> {
        let results = serde_json::to_string_pretty(table)?;
        let raw = self
            .forecast
            .run(&[("question", question), ("sql", sql), ("results", &results)])
            .await?;
        Ok(parse_forecast(&raw).into_forecast())
    }

    /// Answers a question asked in `language`.
    ///
    /// Questions in a language other than English are translated to English
    /// before SQL generation, and the answer is translated back.
    pub async fn answer(
        &self,
        question: &str,
        language: &str,
    ) -> Result<QueryAnswer, PipelineError> {
        info!(question = %question, language = %language, "Answering question");
        let needs_translation = language != PIVOT_LANGUAGE;

        let question_en = if needs_translation {
            self.translator
                .translate(question, language, PIVOT_LANGUAGE)
                .await
                .map_err(|e| PipelineError::new(Stage::Translation, e))?
        } else {
            question.to_string()
        };

        let sql = self
            .generate_sql(&question_en)
            .await
            .map_err(|e| PipelineError::new(Stage::SqlGeneration, e))?;

        let output = execute_or_empty(self.storage(), &sql).await;
        let table = sanitize_rows(&output);

        let answer_en = self
            .summarize(&sql, &table)
            .await
            .map_err(|e| PipelineError::new(Stage::Summarization, e).with_sql(&sql))?;

        let answer = if needs_translation {
            self.translator
                .translate(&answer_en, PIVOT_LANGUAGE, language)
                .await
                .map_err(|e| PipelineError::new(Stage::Translation, e).with_sql(&sql))?
        } else {
            answer_en
        };

        Ok(QueryAnswer {
            answer,
            table,
            sql,
            duration: output.duration_secs(),
        })
    }

    /// Forecasts the next value(s) of the series a question asks about.
    ///
    /// SQL is generated for the question enriched with a request for the full,
    /// ascending yearly series; the forecast prompt uses the question as asked.
    pub async fn forecast(&self, question: &str) -> Result<ForecastAnswer, PipelineError> {
        info!(question = %question, "Forecasting");
        let enriched = format!("{question}{FORECAST_QUESTION_SUFFIX}");

        let sql = self
            .generate_sql(&enriched)
            .await
            .map_err(|e| PipelineError::new(Stage::SqlGeneration, e))?;

        let output = execute_or_empty(self.storage(), &sql).await;
        let table = sanitize_rows(&output);

        let forecast = self
            .compose_forecast(question, &sql, &table)
            .await
            .map_err(|e| PipelineError::new(Stage::Forecasting, e).with_sql(&sql))?;

        Ok(ForecastAnswer {
            forecast,
            sql,
            duration: output.duration_secs(),
        })
    }

    /// Runs a fixed dashboard statement. Failures yield an empty table.
    pub async fn dashboard(&self, query: &DashboardQuery) -> ResultTable {
        let output = execute_or_empty(self.storage(), &query.sql).await;
        let mut table = sanitize_rows(&output);
        for row in &mut table {
            for column in &query.zero_fill {
                match row.get_mut(column) {
                    Some(value) if value.is_null() => *value = Value::from(0),
                    Some(_) => {}
                    None => warn!(column = %column, "zero_fill column missing from dashboard row"),
                }
            }
        }
        table
    }
}
