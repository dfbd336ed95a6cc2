//! # Forecast Response Parsing
//!
//! Extracts the structured forecast from a model's free-text answer. The model
//! is asked for bare JSON but frequently wraps it in prose or code fences, so
//! the outermost brace-delimited span is taken and parsed.

use crate::types::Forecast;
use regex::Regex;
use std::sync::LazyLock;
use tracing::warn;

/// Reason reported when the response contains no JSON object at all.
pub const NO_FORECAST_REASON: &str = "No forecast data returned.";
/// Reason reported when the JSON object cannot be parsed into a forecast.
pub const UNPARSABLE_FORECAST_REASON: &str = "Could not parse LLM output.";

static JSON_OBJECT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[\s\S]*\}").expect("forecast object pattern is valid"));

/// The outcome of parsing a forecast response.
#[derive(Debug)]
pub enum ForecastParse {
    Parsed(Forecast),
    /// No `{...}` span was found.
    NoJson,
    /// A span was found but did not deserialize into a [`Forecast`].
    Malformed(serde_json::Error),
}

impl ForecastParse {
    /// The parsed forecast, or the fallback payload with an explanatory reason.
    pub fn into_forecast(self) -> Forecast {
        match self {
            ForecastParse::Parsed(forecast) => forecast,
            ForecastParse::NoJson => Forecast::fallback(NO_FORECAST_REASON),
            ForecastParse::Malformed(_) => Forecast::fallback(UNPARSABLE_FORECAST_REASON),
        }
    }
}

/// Parses the first `{` through the last `}` of `raw` as a [`Forecast`].
pub fn parse_forecast(raw: &str) -> ForecastParse {
    let Some(span) = JSON_OBJECT.find(raw) else {
        warn!("Forecast response contained no JSON object.");
        return ForecastParse::NoJson;
    };

    match serde_json::from_str::<Forecast>(span.as_str()) {
        Ok(forecast) => ForecastParse::Parsed(forecast),
        Err(e) => {
            warn!(error = %e, "Could not parse forecast JSON.");
            ForecastParse::Malformed(e)
        }
    }
}
