pub mod gemini;
pub mod local;

use crate::errors::PromptError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use std::fmt::Debug;

/// A trait for interacting with an AI provider.
///
/// This trait defines a common interface for the single-shot prompt → text
/// calls the pipeline makes (SQL generation, summaries, forecasts) so that
/// different Large Language Models (e.g., Gemini, local models) can be swapped.
#[async_trait]
pub trait AiProvider: Send + Sync + Debug + DynClone {
    /// Generates a response from a given system and user prompt.
    ///
    /// The result should be a string containing the AI's response.
    async fn generate(&self, system_prompt: &str, user_prompt: &str)
        -> Result<String, PromptError>;
}

dyn_clone::clone_trait_object!(AiProvider);
