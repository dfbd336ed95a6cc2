//! # Result Sanitizer
//!
//! Converts driver-level cells into values that survive a strict JSON encoder:
//! no NaN or Infinity, no decimal or date objects. Every chart and table
//! consumer downstream relies on this.

use crate::types::{Numeric, QueryOutput, ResultTable, Row, SqlValue};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rust_decimal::prelude::ToPrimitive;
use serde_json::{Number, Value};

/// Stringified non-finite values found in the source data itself.
const NON_FINITE_SENTINELS: [&str; 5] = ["nan", "inf", "-inf", "+inf", "infinity"];

/// Returns `true` if the string spells a non-finite number.
pub fn is_non_finite_sentinel(s: &str) -> bool {
    let lowered = s.trim().to_ascii_lowercase();
    NON_FINITE_SENTINELS.contains(&lowered.as_str())
}

/// Converts a float into a JSON number, or null if it is not finite.
fn finite_number(f: f64) -> Value {
    Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)
}

fn numeric_to_json(numeric: Numeric) -> Value {
    match numeric {
        Numeric::Finite(d) => d.to_f64().map(finite_number).unwrap_or(Value::Null),
        Numeric::NaN | Numeric::PosInfinity | Numeric::NegInfinity => Value::Null,
    }
}

/// Sanitizes one driver-level cell.
pub fn sanitize_value(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Bool(b) => Value::Bool(b),
        SqlValue::Int(i) => Value::Number(i.into()),
        SqlValue::Float(f) => finite_number(f),
        SqlValue::Text(s) if is_non_finite_sentinel(&s) => Value::Null,
        SqlValue::Text(s) => Value::String(s),
        SqlValue::Decimal(n) => numeric_to_json(n),
        SqlValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
        SqlValue::Time(t) => Value::String(t.format("%H:%M:%S%.f").to_string()),
        SqlValue::Timestamp(ts) => Value::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
        SqlValue::TimestampTz(ts) => Value::String(ts.to_rfc3339()),
        SqlValue::Json(v) => sanitize_json(v),
        SqlValue::Bytes(bytes) => Value::String(BASE64.encode(bytes)),
        SqlValue::Array(items) => Value::Array(items.into_iter().map(sanitize_value).collect()),
    }
}

/// Sanitizes an arbitrary JSON value, recursing into arrays and objects.
///
/// JSON numbers are always finite, so only sentinel strings change. The
/// function is idempotent.
pub fn sanitize_json(value: Value) -> Value {
    match value {
        Value::String(s) if is_non_finite_sentinel(&s) => Value::Null,
        Value::Array(items) => Value::Array(items.into_iter().map(sanitize_json).collect()),
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key, sanitize_json(value)))
                .collect(),
        ),
        other => other,
    }
}

/// Zips column names with sanitized cells, one mapping per row.
pub fn sanitize_rows(output: &QueryOutput) -> ResultTable {
    output
        .rows
        .iter()
        .map(|row| {
            output
                .columns
                .iter()
                .cloned()
                .zip(row.iter().cloned().map(sanitize_value))
                .collect::<Row>()
        })
        .collect()
}

/// Sanitizes a table that is already in JSON form.
pub fn sanitize_table(table: ResultTable) -> ResultTable {
    table
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(key, value)| (key, sanitize_json(value)))
                .collect()
        })
        .collect()
}
