use aquifer::{PipelineError, PromptError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

/// A custom error type for the server application.
///
/// This enum encapsulates different kinds of errors that can occur within the server,
/// allowing them to be converted into appropriate HTTP responses.
#[derive(Debug)]
pub enum AppError {
    /// The request lacks a required field.
    MissingInput(String),
    /// The requested resource does not exist.
    NotFound(String),
    /// A pipeline stage failed.
    Pipeline(PipelineError),
    /// Errors originating from the `aquifer` library outside the pipeline.
    Prompt(PromptError),
    /// Generic internal server errors.
    Internal(anyhow::Error),
}

/// Conversion from `PipelineError` to `AppError`.
impl From<PipelineError> for AppError {
    fn from(err: PipelineError) -> Self {
        AppError::Pipeline(err)
    }
}

/// Conversion from `PromptError` to `AppError`.
impl From<PromptError> for AppError {
    fn from(err: PromptError) -> Self {
        AppError::Prompt(err)
    }
}

/// Conversion from `anyhow::Error` to `AppError`.
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = match self {
            AppError::MissingInput(msg) => {
                return (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response();
            }
            AppError::NotFound(msg) => {
                return (StatusCode::NOT_FOUND, Json(json!({ "error": msg }))).into_response();
            }
            AppError::Pipeline(err) => {
                error!(stage = %err.stage, sql = ?err.sql, "Pipeline error: {:?}", err.source);
                match &err.sql {
                    Some(sql) => json!({ "error": err.to_string(), "sql": sql }),
                    None => json!({ "error": err.to_string() }),
                }
            }
            AppError::Prompt(err) => {
                error!("PromptError: {:?}", err);
                json!({ "error": err.to_string() })
            }
            AppError::Internal(err) => {
                error!("Internal server error: {:?}", err);
                json!({ "error": "An internal server error occurred." })
            }
        };

        (StatusCode::INTERNAL_SERVER_ERROR, Json(body)).into_response()
    }
}
