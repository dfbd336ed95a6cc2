use crate::{errors::PromptError, providers::translation::Translator};
use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use tracing::debug;

#[derive(Serialize)]
struct InferenceRequest<'a> {
    inputs: &'a str,
    parameters: InferenceParameters<'a>,
}

#[derive(Serialize)]
struct InferenceParameters<'a> {
    src_lang: &'a str,
    tgt_lang: &'a str,
}

#[derive(Deserialize, Debug)]
struct InferenceOutput {
    translation_text: String,
}

/// A translator that calls an HTTP inference endpoint serving an IndicTrans2
/// translation pipeline (Hugging Face Inference API request shape).
#[derive(Clone)]
pub struct IndicTransTranslator {
    client: ReqwestClient,
    api_url: String,
    api_key: Option<String>,
}

impl IndicTransTranslator {
    pub fn new(api_url: String, api_key: Option<String>) -> Result<Self, PromptError> {
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

impl Debug for IndicTransTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IndicTransTranslator")
            .field("api_url", &self.api_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Translator for IndicTransTranslator {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, PromptError> {
        let body = InferenceRequest {
            inputs: text,
            parameters: InferenceParameters {
                src_lang: source_lang,
                tgt_lang: target_lang,
            },
        };

        let mut request_builder = self.client.post(&self.api_url);
        if let Some(key) = self.api_key.as_deref().filter(|k| !k.is_empty()) {
            request_builder = request_builder.bearer_auth(key);
        }

        debug!(api_url = %self.api_url, "--> Sending request to IndicTrans2 endpoint");
        let response = request_builder
            .json(&body)
            .send()
            .await
            .map_err(|e| PromptError::Translation(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PromptError::Translation(format!("{status}: {error_text}")));
        }

        let outputs: Vec<InferenceOutput> = response
            .json()
            .await
            .map_err(|e| PromptError::Translation(e.to_string()))?;

        outputs
            .into_iter()
            .next()
            .map(|o| o.translation_text)
            .ok_or_else(|| PromptError::Translation("endpoint returned no translation".into()))
    }
}
