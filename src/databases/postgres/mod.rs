use std::io::Write;

use anyhow::Context;
use postgres::fallible_iterator::FallibleIterator;
use postgres::types::Type;
use postgres::{Client, NoTls, Transaction};
use tracing::debug;

use crate::databases::table::{Row, Value, quote_identifier};
use crate::databases::traits::{DBInfoProvider, DBReader, DBWriter};

use super::table::{Column, ColumnType, TableInfo};
use super::traits::ReaderIterator;

mod value;

pub struct PostgresDB {
    client: Client,
}

impl PostgresDB {
    pub fn new(uri: &str) -> anyhow::Result<Self> {
        let client = Client::connect(uri, NoTls)?;
        debug!("Connected to postgres");
        return Ok(Self { client });
    }

    fn get_num_rows(&mut self, table: &str) -> anyhow::Result<u64> {
        let count_query = format!("SELECT count(1) FROM {}", quote_identifier(table));
        return self
            .client
            .query_one(&count_query, &[])?
            .get::<_, i64>(0)
            .try_into()
            .context("Failed to convert i64 to u64");
    }

    fn get_columns(&mut self, table: &str) -> anyhow::Result<Vec<Column>> {
        let mut columns = Vec::new();
        let mut names = Vec::new();
        let rows = self
            .client
            .query(
                "SELECT column_name, is_nullable
            FROM information_schema.columns
            WHERE table_schema = current_schema()
            AND table_name = $1
            ORDER BY ordinal_position",
                &[&table],
            )
            .context("Failed to query information about table")?;
        for row in &rows {
            let name: String = row.get(0);
            let is_nullable: &str = row.get(1);
            names.push((name, is_nullable == "YES"));
        }
        let types = self.get_column_types(
            table,
            &itertools::join(names.iter().map(|(name, _)| quote_identifier(name)), ", "),
        )?;
        anyhow::ensure!(
            names.len() == types.len(),
            "Expected to get {} column types, got {}",
            names.len(),
            types.len()
        );
        for ((name, nullable), column_type) in std::iter::zip(names, types) {
            let parsed = ColumnType::try_from(&column_type).unwrap_or_else(|_| {
                debug!("Column {table}.{name} has unsupported type {column_type}");
                ColumnType::Unsupported
            });
            columns.push(Column {
                column_type: parsed,
                name,
                nullable,
            });
        }
        return Ok(columns);
    }

    fn get_column_types(&mut self, table: &str, column_list: &str) -> anyhow::Result<Vec<Type>> {
        let query = format!("SELECT {column_list} FROM {}", quote_identifier(table));
        let stmt = self
            .client
            .prepare(&query)
            .context("Failed to prepare select statement")?;
        return Ok(stmt.columns().iter().map(|c| c.type_().clone()).collect());
    }
}

impl DBInfoProvider for PostgresDB {
    fn table_exists(&mut self, table: &str) -> anyhow::Result<bool> {
        let row = self
            .client
            .query_one(
                "SELECT EXISTS (
                SELECT FROM information_schema.tables
                WHERE table_schema = current_schema()
                AND table_name = $1
            )",
                &[&table],
            )
            .context("Failed to check if table exists")?;
        return Ok(row.get(0));
    }

    fn get_table_info(&mut self, table: &str, no_count: bool) -> anyhow::Result<TableInfo> {
        let mut num_rows = None;
        if !no_count {
            num_rows = Some(
                self.get_num_rows(table)
                    .context("Failed to get number of rows in the table")?,
            );
        }
        let columns = self
            .get_columns(table)
            .context("Failed to get info about table columns")?;
        return Ok(TableInfo {
            name: table.to_string(),
            num_rows,
            columns,
        });
    }

    fn get_tables(&mut self) -> anyhow::Result<Vec<String>> {
        let rows = self
            .client
            .query(
                "SELECT table_name::text
            FROM information_schema.tables
            WHERE table_schema = current_schema()
            AND table_type = 'BASE TABLE'
            ORDER BY table_name",
                &[],
            )
            .context("Failed to list tables")?;
        return Ok(rows.iter().map(|row| row.get(0)).collect());
    }
}

struct PostgresRowsIter<'a> {
    column_types: Vec<Type>,
    rows: postgres::RowIter<'a>,
}

impl Iterator for PostgresRowsIter<'_> {
    type Item = anyhow::Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        return match self
            .rows
            .next()
            .context("Error while reading data from postgres")
        {
            Ok(Some(row)) => {
                let mut result: Row = Vec::with_capacity(self.column_types.len());
                for (idx, column_type) in self.column_types.iter().enumerate() {
                    match Value::from_postgres(&row, idx, column_type) {
                        Ok(val) => result.push(val),
                        Err(e) => return Some(Err(e)),
                    }
                }
                Some(Ok(result))
            }
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        };
    }
}

impl DBReader for PostgresDB {
    fn read_iter(&mut self, target_format: TableInfo) -> anyhow::Result<ReaderIterator<'_>> {
        let query = format!(
            "SELECT {} FROM {}",
            target_format.quoted_column_list(),
            quote_identifier(&target_format.name)
        );
        let stmt = self
            .client
            .prepare(&query)
            .context("Failed to prepare select statement")?;
        let column_types = stmt.columns().iter().map(|c| c.type_().clone()).collect();
        let rows = self
            .client
            .query_raw(&stmt, &[] as &[&str; 0])
            .context("Failed to get data from postgres source")?;
        return Ok(Box::new(PostgresRowsIter { column_types, rows }));
    }
}

// Binary COPY signature (first 11 bytes)
const BINARY_SIGNATURE: &[u8] = b"PGCOPY\n\xFF\r\n\0";

fn write_batch(
    transaction: &mut Transaction<'_>,
    query: &str,
    column_types: &[Type],
    batch: &[Row],
) -> anyhow::Result<()> {
    let mut writer = transaction
        .copy_in(query)
        .context("Failed to start writing data into postgres")?;

    writer.write_all(BINARY_SIGNATURE)?;

    // Flags (4 bytes).
    writer.write_all(&0_i32.to_be_bytes())?;

    // Header extension length (4 bytes)
    writer.write_all(&0_i32.to_be_bytes())?;

    for row in batch {
        // Count of fields
        writer.write_all(&i16::try_from(row.len())?.to_be_bytes())?;
        for (value, column_type) in std::iter::zip(row, column_types) {
            value.write_postgres_bytes(column_type, &mut writer)?;
        }
    }
    writer.write_all(&(-1_i16).to_be_bytes())?;
    writer
        .finish()
        .context("Failed to finish writing to postgres")?;
    return Ok(());
}

impl DBWriter for PostgresDB {
    fn replace_rows(
        &mut self,
        target_format: &TableInfo,
        rows: ReaderIterator<'_>,
        batch_size: usize,
    ) -> anyhow::Result<u64> {
        let table = quote_identifier(&target_format.name);
        let column_list = target_format.quoted_column_list();
        let column_types = self.get_column_types(&target_format.name, &column_list)?;
        let query = format!("COPY {table} ({column_list}) FROM STDIN WITH BINARY");

        // Dropping the transaction on any early return rolls it back
        let mut transaction = self
            .client
            .transaction()
            .context("Failed to start transaction")?;
        transaction
            .batch_execute(&format!("TRUNCATE TABLE {table} CASCADE"))
            .context("Failed to clear destination table")?;

        let mut written: u64 = 0;
        let mut batch: Vec<Row> = Vec::with_capacity(batch_size);
        for row in rows {
            batch.push(row?);
            if batch.len() == batch_size {
                write_batch(&mut transaction, &query, &column_types, &batch)?;
                written += u64::try_from(batch.len())?;
                batch.clear();
            }
        }
        if !batch.is_empty() {
            write_batch(&mut transaction, &query, &column_types, &batch)?;
            written += u64::try_from(batch.len())?;
        }
        transaction
            .commit()
            .context("Failed to commit destination table")?;
        return Ok(written);
    }
}
