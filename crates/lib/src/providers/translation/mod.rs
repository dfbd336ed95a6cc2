//! # Translation Providers
//!
//! Questions may arrive in any language the translation service supports. The
//! pipeline pivots through English: the question is translated to `en` before
//! SQL generation and the summary is translated back afterwards.

#[cfg(feature = "aws")]
pub mod aws;
pub mod google;
pub mod indictrans;

use crate::errors::PromptError;
use async_trait::async_trait;
use dyn_clone::DynClone;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use tracing::{info, warn};

/// A trait for a machine translation service.
#[async_trait]
pub trait Translator: Send + Sync + Debug + DynClone {
    /// Translates `text` from `source_lang` to `target_lang` (ISO 639-1 codes).
    async fn translate(
        &self,
        text: &str,
        source_lang: &str,
        target_lang: &str,
    ) -> Result<String, PromptError>;
}

dyn_clone::clone_trait_object!(Translator);

/// A translator that returns its input unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughTranslator;

#[async_trait]
impl Translator for PassthroughTranslator {
    async fn translate(&self, text: &str, _: &str, _: &str) -> Result<String, PromptError> {
        Ok(text.to_string())
    }
}

/// A translator whose backend could not be configured. It fails on use, so
/// English-only traffic is served without one.
#[derive(Debug, Clone)]
pub struct UnavailableTranslator {
    reason: String,
}

impl UnavailableTranslator {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl Translator for UnavailableTranslator {
    async fn translate(&self, _: &str, _: &str, _: &str) -> Result<String, PromptError> {
        Err(PromptError::Translation(self.reason.clone()))
    }
}

/// The translation backends that can be selected by configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TranslationProviderKind {
    #[default]
    Google,
    Aws,
    Indictrans2,
    None,
}

impl fmt::Display for TranslationProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Google => "google",
            Self::Aws => "aws",
            Self::Indictrans2 => "indictrans2",
            Self::None => "none",
        };
        f.write_str(name)
    }
}

/// Settings for building a [`Translator`].
#[derive(Clone, Default, Deserialize, Serialize)]
pub struct TranslationSettings {
    #[serde(default)]
    pub provider: TranslationProviderKind,
    /// Endpoint override. Required for `indictrans2`.
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    /// AWS region. Falls back to the SDK's default provider chain.
    #[serde(default)]
    pub region: Option<String>,
}

impl Debug for TranslationSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TranslationSettings")
            .field("provider", &self.provider)
            .field("api_url", &self.api_url)
            .field("region", &self.region)
            .finish_non_exhaustive()
    }
}

/// Configuration values substituted from unset variables arrive as empty strings.
fn non_empty(value: &Option<String>) -> Option<String> {
    value.clone().filter(|v| !v.trim().is_empty())
}

/// Builds the translator selected by `settings.provider`.
pub async fn create_translator(
    settings: &TranslationSettings,
) -> Result<Box<dyn Translator>, PromptError> {
    info!(provider = %settings.provider, "Configuring translation provider");
    let translator: Box<dyn Translator> = match settings.provider {
        TranslationProviderKind::Google => match non_empty(&settings.api_key) {
            Some(api_key) => {
                let api_url = non_empty(&settings.api_url)
                    .unwrap_or_else(|| google::GOOGLE_TRANSLATE_API_URL.to_string());
                Box::new(google::GoogleTranslator::new(api_url, api_key)?)
            }
            None => {
                warn!("No google translation API key; only English questions can be answered.");
                Box::new(UnavailableTranslator::new(
                    "an API key is required for the google translation provider",
                ))
            }
        },
        #[cfg(feature = "aws")]
        TranslationProviderKind::Aws => {
            Box::new(aws::AwsTranslator::from_env(non_empty(&settings.region)).await)
        }
        #[cfg(not(feature = "aws"))]
        TranslationProviderKind::Aws => {
            return Err(PromptError::Translation(
                "the aws translation provider requires the `aws` feature".to_string(),
            ))
        }
        TranslationProviderKind::Indictrans2 => {
            let api_url = non_empty(&settings.api_url).ok_or_else(|| {
                PromptError::Translation(
                    "api_url is required for the indictrans2 translation provider".to_string(),
                )
            })?;
            Box::new(indictrans::IndicTransTranslator::new(
                api_url,
                non_empty(&settings.api_key),
            )?)
        }
        TranslationProviderKind::None => Box::new(PassthroughTranslator),
    };
    Ok(translator)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn passthrough_returns_input() {
        let translated = PassthroughTranslator
            .translate("नमस्ते", "hi", "en")
            .await
            .unwrap();
        assert_eq!(translated, "नमस्ते");
    }

    #[test]
    fn provider_kind_parses_lowercase_names() {
        let kind: TranslationProviderKind = serde_json::from_str("\"indictrans2\"").unwrap();
        assert_eq!(kind, TranslationProviderKind::Indictrans2);
        let kind: TranslationProviderKind = serde_json::from_str("\"none\"").unwrap();
        assert_eq!(kind, TranslationProviderKind::None);
    }

    #[tokio::test]
    async fn google_without_key_fails_only_when_used() {
        let settings = TranslationSettings {
            api_key: Some("".to_string()),
            ..Default::default()
        };
        let translator = create_translator(&settings).await.unwrap();
        let err = translator.translate("नमस्ते", "hi", "en").await.unwrap_err();
        match err {
            PromptError::Translation(msg) => assert!(msg.contains("API key"), "got: {msg}"),
            other => panic!("Expected Translation, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn indictrans_requires_an_endpoint() {
        let settings = TranslationSettings {
            provider: TranslationProviderKind::Indictrans2,
            ..Default::default()
        };
        assert!(create_translator(&settings).await.is_err());
    }
}
