//! # Shared Data Types
//!
//! The cell model produced by storage providers, the sanitized table handed to
//! consumers, and the answer/forecast records returned by the pipeline.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// A single cell as decoded from a database driver, before sanitization.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Decimal(Numeric),
    Date(NaiveDate),
    Time(NaiveTime),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Json(Value),
    Bytes(Vec<u8>),
    Array(Vec<SqlValue>),
}

/// A fixed-precision numeric value. PostgreSQL `numeric` can also hold the
/// special values `NaN` and `±Infinity`, which have no decimal representation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Numeric {
    Finite(Decimal),
    NaN,
    PosInfinity,
    NegInfinity,
}

/// The materialized result of one statement.
///
/// `QueryOutput::default()` is the empty result: no columns, no rows, zero duration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryOutput {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<SqlValue>>,
    /// Wall-clock time spent executing the statement and fetching its rows.
    pub duration: Duration,
}

impl QueryOutput {
    /// The elapsed time in seconds, as reported to API consumers.
    pub fn duration_secs(&self) -> f64 {
        self.duration.as_secs_f64()
    }
}

/// One sanitized row: column name to JSON-safe scalar, in column order.
pub type Row = Map<String, Value>;

/// A sanitized, chart-ready table.
pub type ResultTable = Vec<Row>;

/// A year in a forecast series. The dataset stores years as text, so a model
/// may answer with either `2024` or `"2023-24"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ForecastYear {
    Number(i64),
    Label(String),
}

/// One point of a forecast series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPoint {
    #[serde(deserialize_with = "lenient_year")]
    pub year: ForecastYear,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub value: Option<f64>,
    /// `true` for observed data, `false` for a model prediction.
    pub existing: bool,
}

/// The structured forecast returned by the forecasting model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Forecast {
    pub data: Vec<ForecastPoint>,
    #[serde(default)]
    pub reason: String,
}

impl Forecast {
    /// The payload returned when no usable forecast could be extracted.
    pub fn fallback(reason: impl Into<String>) -> Self {
        Self {
            data: Vec::new(),
            reason: reason.into(),
        }
    }
}

/// The result of answering a question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryAnswer {
    pub answer: String,
    pub table: ResultTable,
    pub sql: String,
    pub duration: f64,
}

/// The result of forecasting from a question.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForecastAnswer {
    pub forecast: Forecast,
    pub sql: String,
    pub duration: f64,
}

/// A fixed aggregation statement backing one dashboard chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardQuery {
    pub sql: String,
    /// Columns whose missing or non-finite values are reported as `0`.
    #[serde(default)]
    pub zero_fill: Vec<String>,
}

impl DashboardQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            zero_fill: Vec::new(),
        }
    }

    pub fn zero_fill<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.zero_fill = columns.into_iter().map(Into::into).collect();
        self
    }
}

/// Accepts a JSON number, a numeric string, or null. Non-finite or unparsable
/// strings become `None`.
fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::Number(n) => Ok(n.as_f64()),
        Value::String(s) => Ok(s.trim().parse::<f64>().ok().filter(|f| f.is_finite())),
        other => Err(serde::de::Error::custom(format!(
            "expected a number, got {other}"
        ))),
    }
}

/// Accepts `2024`, `2024.0` and `"2023-24"`. A fractional year is an error.
fn lenient_year<'de, D>(deserializer: D) -> Result<ForecastYear, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .map(ForecastYear::Number)
            .ok_or_else(|| serde::de::Error::custom(format!("expected a whole year, got {n}"))),
        Value::String(s) => Ok(ForecastYear::Label(s)),
        other => Err(serde::de::Error::custom(format!(
            "expected a year, got {other}"
        ))),
    }
}
