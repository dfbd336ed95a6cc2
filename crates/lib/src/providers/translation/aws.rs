use crate::{errors::PromptError, providers::translation::Translator};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_translate::Client;
use std::fmt::{self, Debug};
use tracing::debug;

/// A translator backed by Amazon Translate.
///
/// Credentials come from the standard AWS provider chain
/// (`AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY`, profiles, instance roles).
#[derive(Clone)]
pub struct AwsTranslator {
    client: Client,
}

impl AwsTranslator {
    /// Loads the SDK configuration from the environment, overriding the region
    /// when one is given.
    pub async fn from_env(region: Option<String>) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = region.filter(|r| !r.is_empty()) {
            loader = loader.region(Region::new(region));
        }
        let sdk_config = loader.load().await;
        Self {
            client: Client::new(&sdk_config),
        }
    }
}

impl Debug for AwsTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsTranslator").finish_non_exhaustive()
    }
}

#[async_trait]
impl Translator for AwsTranslator {
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, PromptError> {
        debug!(source = source_lang, target = target_lang, "--> Sending request to Amazon Translate");
        let output = self
            .client
            .translate_text()
            .text(text)
            .source_language_code(source_lang)
            .target_language_code(target_lang)
            .send()
            .await
            .map_err(|e| PromptError::Translation(e.to_string()))?;
        Ok(output.translated_text().to_string())
    }
}
