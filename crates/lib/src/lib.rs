//! # Groundwater Questions to SQL
//!
//! This crate turns natural-language questions about groundwater assessment
//! data into SQL using a configurable AI provider, runs the SQL against a
//! storage provider, and returns JSON-safe tables together with a
//! natural-language summary or a structured forecast.

pub mod constants;
pub mod dashboards;
pub mod errors;
pub mod executor;
pub mod forecast;
pub mod pipeline;
pub mod prompts;
pub mod providers;
pub mod sanitize;
pub mod schema;
pub mod sql;
pub mod types;

pub use errors::{PipelineError, PromptError, Stage};
pub use pipeline::{QueryPipeline, QueryPipelineBuilder, Task};
pub use prompts::PromptTemplate;
pub use schema::SchemaContext;
pub use types::{
    DashboardQuery, Forecast, ForecastAnswer, QueryAnswer, QueryOutput, ResultTable, SqlValue,
};
