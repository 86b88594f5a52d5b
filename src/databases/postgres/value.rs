use std::io::Write;
use std::str::FromStr;

use anyhow::Context;
use bytes::BytesMut;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use postgres::types::{FromSql, IsNull, ToSql, Type};
use rust_decimal::Decimal;

use crate::databases::table::{ColumnType, Value};

impl TryFrom<&Type> for ColumnType {
    type Error = anyhow::Error;

    fn try_from(value: &Type) -> Result<Self, Self::Error> {
        let column_type = match *value {
            Type::BOOL => ColumnType::Bool,
            Type::INT2 | Type::INT4 | Type::INT8 => ColumnType::I64,
            Type::FLOAT4 | Type::FLOAT8 => ColumnType::F64,
            Type::NUMERIC => ColumnType::Decimal,
            Type::VARCHAR | Type::TEXT | Type::BPCHAR | Type::NAME => ColumnType::String,
            Type::BYTEA => ColumnType::Bytes,
            Type::TIMESTAMP => ColumnType::Timestamp,
            Type::TIMESTAMPTZ => ColumnType::TimestampTz,
            Type::DATE => ColumnType::Date,
            Type::TIME => ColumnType::Time,
            Type::JSON | Type::JSONB => ColumnType::Json,
            Type::UUID => ColumnType::Uuid,
            _ => return Err(anyhow::anyhow!("Unsupported postgres type {value}")),
        };
        return Ok(column_type);
    }
}

fn get<'a, T: FromSql<'a>>(
    row: &'a postgres::Row,
    idx: usize,
    wrap: impl FnOnce(T) -> Value,
) -> anyhow::Result<Value> {
    return Ok(row
        .try_get::<_, Option<T>>(idx)
        .with_context(|| format!("Failed to read column {idx}"))?
        .map_or(Value::Null, wrap));
}

impl Value {
    pub(crate) fn from_postgres(
        row: &postgres::Row,
        idx: usize,
        column_type: &Type,
    ) -> anyhow::Result<Value> {
        return match *column_type {
            Type::BOOL => get(row, idx, Value::Bool),
            Type::INT2 => get(row, idx, |num: i16| Value::I64(num.into())),
            Type::INT4 => get(row, idx, |num: i32| Value::I64(num.into())),
            Type::INT8 => get(row, idx, Value::I64),
            Type::FLOAT4 => get(row, idx, |num: f32| Value::F64(num.into())),
            Type::FLOAT8 => get(row, idx, Value::F64),
            Type::NUMERIC => get(row, idx, Value::Decimal),
            Type::VARCHAR | Type::TEXT | Type::BPCHAR | Type::NAME => {
                get(row, idx, Value::String)
            }
            Type::BYTEA => get(row, idx, Value::Bytes),
            Type::TIMESTAMP => get(row, idx, Value::Timestamp),
            Type::TIMESTAMPTZ => get(row, idx, Value::TimestampTz),
            Type::DATE => get(row, idx, Value::Date),
            Type::TIME => get(row, idx, Value::Time),
            Type::JSON | Type::JSONB => get(row, idx, Value::Json),
            Type::UUID => get(row, idx, Value::Uuid),
            _ => Err(anyhow::anyhow!("Unsupported postgres type {column_type}")),
        };
    }

    pub(crate) fn write_postgres_bytes(
        &self,
        column_type: &Type,
        writer: &mut impl Write,
    ) -> anyhow::Result<()> {
        match (column_type, self) {
            (_, Value::Null) => writer.write_all(&(-1_i32).to_be_bytes())?,
            (&Type::INT8, &Value::I64(num)) => encode(&num, column_type, writer)?,
            (&Type::INT4, &Value::I64(num)) => encode(&i32::try_from(num)?, column_type, writer)?,
            (&Type::INT2, &Value::I64(num)) => encode(&i16::try_from(num)?, column_type, writer)?,
            (&Type::FLOAT8, &Value::F64(num)) => encode(&num, column_type, writer)?,
            (&Type::FLOAT4, &Value::F64(num)) => encode(&(num as f32), column_type, writer)?,
            (&Type::NUMERIC, Value::Decimal(num)) => encode(num, column_type, writer)?,
            (&Type::NUMERIC, &Value::I64(num)) => {
                encode(&Decimal::from(num), column_type, writer)?
            }
            (&Type::NUMERIC, &Value::F64(num)) => {
                encode(&Decimal::try_from(num)?, column_type, writer)?
            }
            (&Type::BOOL, &Value::Bool(val)) => encode(&val, column_type, writer)?,
            // SQLite keeps booleans as integers
            (&Type::BOOL, &Value::I64(num)) => encode(&(num != 0), column_type, writer)?,
            (&Type::BYTEA, Value::Bytes(bytes)) => encode(bytes, column_type, writer)?,
            (&Type::VARCHAR | &Type::TEXT | &Type::BPCHAR | &Type::NAME, Value::String(string)) => {
                encode(string, column_type, writer)?
            }
            (&Type::TIMESTAMP, Value::Timestamp(ts)) => encode(ts, column_type, writer)?,
            (&Type::TIMESTAMP, Value::TimestampTz(ts)) => {
                encode(&ts.naive_utc(), column_type, writer)?
            }
            (&Type::TIMESTAMPTZ, Value::TimestampTz(ts)) => encode(ts, column_type, writer)?,
            (&Type::TIMESTAMPTZ, Value::Timestamp(ts)) => {
                encode(&ts.and_utc(), column_type, writer)?
            }
            (&Type::DATE, Value::Date(date)) => encode(date, column_type, writer)?,
            (&Type::TIME, Value::Time(time)) => encode(time, column_type, writer)?,
            (&Type::JSON | &Type::JSONB, Value::Json(json)) => encode(json, column_type, writer)?,
            (&Type::UUID, Value::Uuid(uuid)) => encode(uuid, column_type, writer)?,
            (&Type::UUID, Value::Bytes(bytes)) => {
                encode(&uuid::Uuid::from_slice(bytes)?, column_type, writer)?
            }
            (_, Value::String(string)) => write_parsed(string, column_type, writer)?,
            _ => {
                return Err(anyhow::anyhow!(
                    "Unsupported type conversion from {self:?} to {column_type}"
                ));
            }
        };
        return Ok(());
    }
}

/// Text coming from SQLite for columns that postgres stores natively.
fn write_parsed(string: &str, column_type: &Type, writer: &mut impl Write) -> anyhow::Result<()> {
    match *column_type {
        Type::NUMERIC => encode(&Decimal::from_str(string)?, column_type, writer)?,
        Type::TIMESTAMP => encode(&parse_timestamp(string)?, column_type, writer)?,
        Type::TIMESTAMPTZ => encode(&parse_timestamptz(string)?, column_type, writer)?,
        Type::DATE => encode(&NaiveDate::from_str(string)?, column_type, writer)?,
        Type::TIME => encode(&NaiveTime::from_str(string)?, column_type, writer)?,
        Type::JSON | Type::JSONB => {
            let json: serde_json::Value = serde_json::from_str(string)?;
            encode(&json, column_type, writer)?
        }
        Type::UUID => encode(&uuid::Uuid::from_str(string)?, column_type, writer)?,
        _ => {
            return Err(anyhow::anyhow!(
                "Unsupported type conversion from text to {column_type}"
            ));
        }
    }
    return Ok(());
}

fn parse_timestamp(string: &str) -> anyhow::Result<NaiveDateTime> {
    return NaiveDateTime::parse_from_str(string, "%Y-%m-%d %H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::from_str(string))
        .with_context(|| format!("Invalid timestamp {string}"));
}

fn parse_timestamptz(string: &str) -> anyhow::Result<DateTime<Utc>> {
    let parsed = DateTime::parse_from_str(string, "%Y-%m-%d %H:%M:%S%.f%:z")
        .or_else(|_| DateTime::parse_from_rfc3339(string));
    if let Ok(ts) = parsed {
        return Ok(ts.with_timezone(&Utc));
    }
    // Naive text is taken as UTC
    return parse_timestamp(string)
        .map(|ts| ts.and_utc())
        .with_context(|| format!("Invalid timestamp with time zone {string}"));
}

fn encode<T: ToSql>(value: &T, column_type: &Type, writer: &mut impl Write) -> anyhow::Result<()> {
    let mut buffer = BytesMut::new();
    let is_null = value
        .to_sql_checked(column_type, &mut buffer)
        .map_err(|err| anyhow::anyhow!("Failed to encode value as {column_type}: {err}"))?;
    match is_null {
        IsNull::Yes => writer.write_all(&(-1_i32).to_be_bytes())?,
        IsNull::No => {
            writer.write_all(&i32::try_from(buffer.len())?.to_be_bytes())?;
            writer.write_all(&buffer)?;
        }
    }
    return Ok(());
}
