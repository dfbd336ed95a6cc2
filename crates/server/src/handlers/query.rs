//! # Question Handlers
//!
//! `POST /query` answers a question with a summary and the result table;
//! `POST /forecast` predicts the next value(s) of the series a question asks
//! about.

use super::{AppError, AppState, NO_QUESTION_MESSAGE};
use crate::types::{non_blank, ForecastRequest, QueryRequest};
use aquifer::{ForecastAnswer, QueryAnswer};
use axum::{extract::State, Json};
use tracing::info;

/// The handler for the `/query` endpoint.
pub async fn query_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryAnswer>, AppError> {
    let question = non_blank(payload.question.as_deref())
        .ok_or_else(|| AppError::MissingInput(NO_QUESTION_MESSAGE.to_string()))?;
    let language = payload.language();
    info!(question = %question, language = %language, "Received query request");

    let answer = app_state.pipeline.answer(question, language).await?;
    Ok(Json(answer))
}

/// The handler for the `/forecast` endpoint.
pub async fn forecast_handler(
    State(app_state): State<AppState>,
    Json(payload): Json<ForecastRequest>,
) -> Result<Json<ForecastAnswer>, AppError> {
    let question = non_blank(payload.question.as_deref())
        .ok_or_else(|| AppError::MissingInput(NO_QUESTION_MESSAGE.to_string()))?;
    info!(question = %question, "Received forecast request");

    let forecast = app_state.pipeline.forecast(question).await?;
    Ok(Json(forecast))
}
