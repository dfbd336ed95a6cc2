//! # PostgreSQL Storage Provider
//!
//! Executes statements against the groundwater dataset over a fresh
//! `tokio-postgres` connection per call and decodes each cell into a
//! [`SqlValue`].

use crate::{
    errors::PromptError,
    providers::db::storage::Storage,
    types::{Numeric, QueryOutput, SqlValue},
};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::{
    error::Error,
    fmt::{self, Debug},
    time::Instant,
};
use tokio_postgres::{
    types::{FromSql, Type},
    Column, Config, NoTls, Row,
};
use tracing::{debug, warn};

/// Connection parameters for a PostgreSQL server.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PostgresSettings {
    pub host: String,
    pub port: u16,
    pub dbname: String,
    pub user: String,
    pub password: String,
}

impl Debug for PostgresSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("dbname", &self.dbname)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}

/// A provider for a PostgreSQL database. No connection is held between calls.
#[derive(Clone)]
pub struct PostgresProvider {
    config: Config,
    settings: PostgresSettings,
}

impl PostgresProvider {
    pub fn new(settings: PostgresSettings) -> Self {
        let mut config = Config::new();
        config
            .host(&settings.host)
            .port(settings.port)
            .dbname(&settings.dbname)
            .user(&settings.user)
            .application_name("aquifer");
        if !settings.password.is_empty() {
            config.password(&settings.password);
        }
        Self { config, settings }
    }
}

impl Debug for PostgresProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostgresProvider")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Storage for PostgresProvider {
    fn name(&self) -> &str {
        "PostgreSQL"
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryOutput, PromptError> {
        debug!(sql = %sql, "--> Executing PostgreSQL statement");

        let (client, connection) = self
            .config
            .connect(NoTls)
            .await
            .map_err(|e| PromptError::StorageConnection(e.to_string()))?;

        // The connection future drives the socket; it resolves once `client` is dropped.
        let driver = tokio::spawn(async move {
            if let Err(e) = connection.await {
                warn!(error = %e, "PostgreSQL connection closed with an error");
            }
        });

        let start = Instant::now();
        let fetched = async {
            let statement = client.prepare(sql).await?;
            let rows = client.query(&statement, &[]).await?;
            Ok::<_, tokio_postgres::Error>((statement, rows))
        }
        .await;
        let duration = start.elapsed();

        drop(client);
        let _ = driver.await;

        let (statement, rows) =
            fetched.map_err(|e| PromptError::StorageOperationFailed(e.to_string()))?;

        let columns = statement.columns();
        Ok(QueryOutput {
            columns: columns.iter().map(|c| c.name().to_string()).collect(),
            rows: rows.iter().map(|row| decode_row(row, columns)).collect(),
            duration,
        })
    }
}

fn decode_row(row: &Row, columns: &[Column]) -> Vec<SqlValue> {
    columns
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            decode_cell(row, idx, column.type_()).unwrap_or_else(|e| {
                warn!(
                    column = column.name(),
                    r#type = %column.type_(),
                    error = %e,
                    "Could not decode cell; reporting null"
                );
                SqlValue::Null
            })
        })
        .collect()
}

fn get<'a, T, F>(row: &'a Row, idx: usize, f: F) -> Result<SqlValue, tokio_postgres::Error>
where
    T: FromSql<'a>,
    F: FnOnce(T) -> SqlValue,
{
    Ok(row.try_get::<_, Option<T>>(idx)?.map(f).unwrap_or(SqlValue::Null))
}

fn array<'a, T, F>(row: &'a Row, idx: usize, f: F) -> Result<SqlValue, tokio_postgres::Error>
where
    T: FromSql<'a>,
    F: Fn(T) -> SqlValue,
{
    get::<Vec<Option<T>>, _>(row, idx, |items| {
        SqlValue::Array(
            items
                .into_iter()
                .map(|item| item.map(&f).unwrap_or(SqlValue::Null))
                .collect(),
        )
    })
}

fn decode_cell(row: &Row, idx: usize, ty: &Type) -> Result<SqlValue, tokio_postgres::Error> {
    match *ty {
        Type::BOOL => get(row, idx, SqlValue::Bool),
        Type::INT2 => get(row, idx, |v: i16| SqlValue::Int(v.into())),
        Type::INT4 => get(row, idx, |v: i32| SqlValue::Int(v.into())),
        Type::INT8 => get(row, idx, SqlValue::Int),
        Type::OID => get(row, idx, |v: u32| SqlValue::Int(v.into())),
        Type::FLOAT4 => get(row, idx, |v: f32| SqlValue::Float(v.into())),
        Type::FLOAT8 => get(row, idx, SqlValue::Float),
        Type::NUMERIC => get(row, idx, |v: PgNumeric| SqlValue::Decimal(v.0)),
        Type::DATE => get(row, idx, |v: NaiveDate| SqlValue::Date(v)),
        Type::TIME => get(row, idx, |v: NaiveTime| SqlValue::Time(v)),
        Type::TIMESTAMP => get(row, idx, |v: NaiveDateTime| SqlValue::Timestamp(v)),
        Type::TIMESTAMPTZ => get(row, idx, |v: DateTime<Utc>| SqlValue::TimestampTz(v)),
        Type::JSON | Type::JSONB => get(row, idx, SqlValue::Json),
        Type::BYTEA => get(row, idx, SqlValue::Bytes),
        Type::BOOL_ARRAY => array(row, idx, SqlValue::Bool),
        Type::INT2_ARRAY => array(row, idx, |v: i16| SqlValue::Int(v.into())),
        Type::INT4_ARRAY => array(row, idx, |v: i32| SqlValue::Int(v.into())),
        Type::INT8_ARRAY => array(row, idx, SqlValue::Int),
        Type::FLOAT4_ARRAY => array(row, idx, |v: f32| SqlValue::Float(v.into())),
        Type::FLOAT8_ARRAY => array(row, idx, SqlValue::Float),
        Type::NUMERIC_ARRAY => array(row, idx, |v: PgNumeric| SqlValue::Decimal(v.0)),
        Type::TEXT_ARRAY | Type::VARCHAR_ARRAY => array(row, idx, SqlValue::Text),
        // `String` accepts text-like types (TEXT, VARCHAR, BPCHAR, NAME, citext, ...).
        _ => get(row, idx, SqlValue::Text),
    }
}

/// Sign words of the PostgreSQL binary `numeric` format for its special values.
const NUMERIC_NAN: u16 = 0xC000;
const NUMERIC_PINF: u16 = 0xD000;
const NUMERIC_NINF: u16 = 0xF000;

/// A `numeric` that also decodes `NaN` and `±Infinity`, which `Decimal` rejects.
struct PgNumeric(Numeric);

impl<'a> FromSql<'a> for PgNumeric {
    fn from_sql(ty: &Type, raw: &'a [u8]) -> Result<Self, Box<dyn Error + Sync + Send>> {
        // Header: ndigits, weight, sign, dscale (each a big-endian i16).
        if let Some(sign) = raw.get(4..6) {
            match u16::from_be_bytes([sign[0], sign[1]]) {
                NUMERIC_NAN => return Ok(PgNumeric(Numeric::NaN)),
                NUMERIC_PINF => return Ok(PgNumeric(Numeric::PosInfinity)),
                NUMERIC_NINF => return Ok(PgNumeric(Numeric::NegInfinity)),
                _ => {}
            }
        }
        Decimal::from_sql(ty, raw).map(|d| PgNumeric(Numeric::Finite(d)))
    }

    fn accepts(ty: &Type) -> bool {
        *ty == Type::NUMERIC
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric_header(sign: u16) -> Vec<u8> {
        let mut raw = Vec::new();
        raw.extend_from_slice(&0i16.to_be_bytes());
        raw.extend_from_slice(&0i16.to_be_bytes());
        raw.extend_from_slice(&sign.to_be_bytes());
        raw.extend_from_slice(&0i16.to_be_bytes());
        raw
    }

    #[test]
    fn decodes_special_numeric_values() {
        let nan = PgNumeric::from_sql(&Type::NUMERIC, &numeric_header(NUMERIC_NAN)).unwrap();
        assert_eq!(nan.0, Numeric::NaN);
        let pinf = PgNumeric::from_sql(&Type::NUMERIC, &numeric_header(NUMERIC_PINF)).unwrap();
        assert_eq!(pinf.0, Numeric::PosInfinity);
        let ninf = PgNumeric::from_sql(&Type::NUMERIC, &numeric_header(NUMERIC_NINF)).unwrap();
        assert_eq!(ninf.0, Numeric::NegInfinity);
    }

    #[test]
    fn decodes_finite_numeric() {
        // 12.5 => ndigits 2, weight 0, positive, dscale 1, digits [12, 5000]
        let mut raw = Vec::new();
        for word in [2i16, 0, 0, 1, 12, 5000] {
            raw.extend_from_slice(&word.to_be_bytes());
        }
        let value = PgNumeric::from_sql(&Type::NUMERIC, &raw).unwrap();
        assert_eq!(value.0, Numeric::Finite(Decimal::new(125, 1)));
    }

    #[tokio::test]
    async fn unreachable_server_is_a_connection_error() {
        let provider = PostgresProvider::new(PostgresSettings {
            host: "127.0.0.1".to_string(),
            port: 1,
            dbname: "groundwater".to_string(),
            user: "nobody".to_string(),
            password: String::new(),
        });
        let err = provider.execute_query("SELECT 1").await.unwrap_err();
        assert!(matches!(err, PromptError::StorageConnection(_)));
    }
}
