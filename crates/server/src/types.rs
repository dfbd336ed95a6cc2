//! # API Payloads
//!
//! Request bodies accepted by the JSON endpoints. Responses are the library's
//! `QueryAnswer`, `ForecastAnswer` and `ResultTable`, serialized as-is.

use aquifer::constants::PIVOT_LANGUAGE;
use serde::Deserialize;

/// The body of `POST /query`.
#[derive(Debug, Deserialize, Default)]
pub struct QueryRequest {
    #[serde(default)]
    pub question: Option<String>,
    /// ISO 639-1 code of the question's language. Defaults to English.
    #[serde(default)]
    pub language: Option<String>,
}

impl QueryRequest {
    pub fn language(&self) -> &str {
        self.language
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .unwrap_or(PIVOT_LANGUAGE)
    }
}

/// The body of `POST /forecast`.
#[derive(Debug, Deserialize, Default)]
pub struct ForecastRequest {
    #[serde(default)]
    pub question: Option<String>,
}

/// Returns the question with surrounding whitespace removed, or `None` when it
/// is absent or blank.
pub fn non_blank(question: Option<&str>) -> Option<&str> {
    question.map(str::trim).filter(|q| !q.is_empty())
}
