use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use rust_decimal::Decimal;
use std::str::FromStr;

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    I64(i64),
    F64(f64),
    Decimal(Decimal),
    String(String),
    Bytes(Vec<u8>),
    Timestamp(NaiveDateTime),
    TimestampTz(DateTime<Utc>),
    Date(NaiveDate),
    Time(NaiveTime),
    Json(serde_json::Value),
    Uuid(uuid::Uuid),
    Null,
}

pub type Row = Vec<Value>;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ColumnType {
    Bool,
    I64,
    F64,
    Decimal,
    String,
    Bytes,
    Timestamp,
    TimestampTz,
    Date,
    Time,
    Json,
    Uuid,
    /// Declared type values can't be moved for. Harmless unless the column
    /// is one of the copied ones.
    Unsupported,
}

impl ColumnType {
    pub fn from_declared(declared: &str) -> ColumnType {
        return ColumnType::from_str(declared).unwrap_or(ColumnType::Unsupported);
    }
}

impl FromStr for ColumnType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<ColumnType, Self::Err> {
        let formated = s.trim().to_lowercase();
        // Declared types may carry a size or modifiers, e.g. varchar(255) or
        // "integer unsigned"
        let base = formated
            .split(['(', ' '])
            .next()
            .unwrap_or_default();
        return match base {
            "bool" | "boolean" => Ok(ColumnType::Bool),
            "tinyint" | "smallint" | "integer" | "int" | "bigint" | "serial" | "bigserial"
            | "smallserial" => Ok(ColumnType::I64),
            "float" | "real" | "double" => Ok(ColumnType::F64),
            "numeric" | "decimal" => Ok(ColumnType::Decimal),
            "character" | "varchar" | "nvarchar" | "char" | "nchar" | "clob" | "text" => {
                Ok(ColumnType::String)
            }
            "" | "blob" | "bytea" => Ok(ColumnType::Bytes),
            "datetime" | "timestamp" => Ok(ColumnType::Timestamp),
            "timestamptz" => Ok(ColumnType::TimestampTz),
            "date" => Ok(ColumnType::Date),
            "time" => Ok(ColumnType::Time),
            "json" | "jsonb" => Ok(ColumnType::Json),
            "uuid" => Ok(ColumnType::Uuid),
            _ => Err(anyhow::anyhow!("Unknown column type {s}")),
        };
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TableInfo {
    pub name: String,
    pub num_rows: Option<u64>,
    pub columns: Vec<Column>,
}

impl TableInfo {
    pub fn column_names(&self) -> Vec<&str> {
        return self.columns.iter().map(|c| c.name.as_str()).collect();
    }

    /// Same table restricted to the given columns, in the given order.
    pub fn project(&self, columns: Vec<Column>) -> TableInfo {
        return TableInfo {
            name: self.name.clone(),
            num_rows: self.num_rows,
            columns,
        };
    }

    pub fn quoted_column_list(&self) -> String {
        return itertools::join(self.columns.iter().map(|c| quote_identifier(&c.name)), ", ");
    }
}

/// Identifiers are always quoted, so mixed case names survive as is.
pub fn quote_identifier(name: &str) -> String {
    return format!("\"{}\"", name.replace('"', "\"\""));
}
