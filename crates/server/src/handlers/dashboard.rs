//! # Dashboard Handlers
//!
//! Serves the fixed aggregation statements configured under `dashboards`.

use super::{AppError, AppState};
use aquifer::ResultTable;
use axum::{
    extract::{Path, State},
    Json,
};
use tracing::info;

/// The handler for `GET /dashboard/{name}`.
pub async fn dashboard_handler(
    State(app_state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<ResultTable>, AppError> {
    let query = app_state
        .dashboards
        .get(&name)
        .ok_or_else(|| AppError::NotFound(format!("Unknown dashboard '{name}'.")))?;
    info!(dashboard = %name, "Serving dashboard");

    Ok(Json(app_state.pipeline.dashboard(query).await))
}
