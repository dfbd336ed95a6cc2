//! # API Route Handlers
//!
//! This module organizes all the Axum route handlers for the `aquifer-server`.
//! The handlers are split into sub-modules by endpoint family.

pub mod dashboard;
pub mod general;
pub mod query;

// Re-export all handlers so the router can reach them under a single
// `handlers::` path.
pub use dashboard::*;
pub use general::*;
pub use query::*;

// Shared items used by multiple handler modules.
use super::{errors::AppError, state::AppState};

/// The message returned when a request carries no usable question.
pub const NO_QUESTION_MESSAGE: &str = "No question provided.";
