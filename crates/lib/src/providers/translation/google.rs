use crate::{errors::PromptError, providers::translation::Translator};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use tracing::debug;

/// Cloud Translation API (Basic, v2) endpoint.
pub const GOOGLE_TRANSLATE_API_URL: &str =
    "https://translation.googleapis.com/language/translate/v2";

#[derive(Serialize)]
struct TranslateRequest<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    format: &'a str,
}

#[derive(Deserialize, Debug)]
struct TranslateResponse {
    data: TranslateData,
}

#[derive(Deserialize, Debug)]
struct TranslateData {
    #[serde(default)]
    translations: Vec<Translation>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct Translation {
    translated_text: String,
}

/// A translator backed by the Google Cloud Translation REST API.
#[derive(Clone)]
pub struct GoogleTranslator {
    client: ReqwestClient,
    api_url: String,
    api_key: String,
}

impl GoogleTranslator {
    pub fn new(api_url: String, api_key: String) -> Result<Self, PromptError> {
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

impl Debug for GoogleTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GoogleTranslator")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Translator for GoogleTranslator {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, PromptError> {
        let body = TranslateRequest {
            q: text,
            source: source_lang,
            target: target_lang,
            format: "text",
        };

        debug!(source = source_lang, target = target_lang, "--> Sending request to Google Translate");
        let response = self
            .client
            .post(&self.api_url)
            .query(&[("key", &self.api_key)])
            .json(&body)
            .send()
            .await
            .map_err(|e| PromptError::Translation(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PromptError::Translation(format!("{status}: {error_text}")));
        }

        let parsed: TranslateResponse = response
            .json()
            .await
            .map_err(|e| PromptError::Translation(e.to_string()))?;

        parsed
            .data
            .translations
            .into_iter()
            .next()
            .map(|t| t.translated_text)
            .ok_or_else(|| PromptError::Translation("response contained no translations".into()))
    }
}
