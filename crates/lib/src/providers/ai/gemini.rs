use crate::{errors::PromptError, providers::ai::AiProvider};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use tracing::debug;

/// The public endpoint template for Gemini's `generateContent` method.
pub const GEMINI_API_URL_TEMPLATE: &str =
    "https://generativelanguage.googleapis.com/v1beta/models/{model}:generateContent";

/// The model the groundwater assistant was built against.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-1.5-flash-latest";

/// Builds the `generateContent` URL for a model name.
pub fn gemini_api_url(model_name: &str) -> String {
    GEMINI_API_URL_TEMPLATE.replace("{model}", model_name)
}

// --- Gemini-specific request and response structures ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
}

#[derive(Serialize)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Serialize)]
struct Part {
    text: String,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Candidate {
    content: ContentResponse,
}

#[derive(Deserialize, Debug)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Deserialize, Debug)]
struct PartResponse {
    #[serde(default)]
    text: String,
}

// --- Gemini Provider implementation ---

/// A provider for interacting with the Google Gemini API.
#[derive(Clone)]
pub struct GeminiProvider {
    client: ReqwestClient,
    api_url: String,
    api_key: String,
}

impl GeminiProvider {
    /// Creates a new `GeminiProvider`.
    pub fn new(api_url: String, api_key: String) -> Result<Self, PromptError> {
        if api_key.trim().is_empty() {
            return Err(PromptError::MissingAiProvider(
                "an API key is required for the Gemini provider".to_string(),
            ));
        }
        let client = ReqwestClient::builder()
            .build()
            .map_err(PromptError::ReqwestClientBuild)?;
        Ok(Self {
            client,
            api_url,
            api_key,
        })
    }
}

impl Debug for GeminiProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiProvider")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AiProvider for GeminiProvider {
    /// Generates a response using the Gemini API.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
    ) -> Result<String, PromptError> {
        let system_instruction = (!system_prompt.trim().is_empty()).then(|| Content {
            parts: vec![Part {
                text: system_prompt.to_string(),
            }],
        });
        let request_body = GeminiRequest {
            system_instruction,
            contents: vec![Content {
                parts: vec![Part {
                    text: user_prompt.to_string(),
                }],
            }],
        };

        debug!(api_url = %self.api_url, "--> Sending request to Gemini");
        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", &self.api_key)])
            .json(&request_body)
            .send()
            .await
            .map_err(PromptError::AiRequest)?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PromptError::AiApi(format!("{status}: {error_text}")));
        }

        let gemini_response: GeminiResponse = response
            .json()
            .await
            .map_err(PromptError::AiDeserialization)?;

        let Some(candidate) = gemini_response.candidates.first() else {
            let reason = gemini_response
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "no reason given".to_string());
            return Err(PromptError::AiApi(format!(
                "Gemini returned no candidates (block reason: {reason})"
            )));
        };

        let raw_response = candidate
            .content
            .parts
            .iter()
            .map(|p| p.text.as_str())
            .collect::<String>();

        if raw_response.trim().is_empty() {
            return Err(PromptError::AiApi(
                "Gemini returned an empty response".to_string(),
            ));
        }

        Ok(raw_response)
    }
}
