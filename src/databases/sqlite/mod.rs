use anyhow::Context;
use rusqlite::{Connection, OpenFlags, Rows, Statement, params_from_iter};
use tracing::debug;

use crate::databases::table::{Row, Value, quote_identifier};
use crate::databases::traits::{DBInfoProvider, DBReader, DBWriter};

use super::table::{Column, ColumnType, TableInfo};
use super::traits::ReaderIterator;

mod value;

pub struct SqliteDB {
    connection: Connection,
}

impl SqliteDB {
    pub fn new(uri: &str) -> anyhow::Result<Self> {
        let path = uri.replace("sqlite://", "");
        let conn = Connection::open_with_flags(
            &path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI,
        )?;
        debug!("Opened sqlite database {path}");
        return Ok(SqliteDB { connection: conn });
    }

    fn get_num_rows(&mut self, table: &str) -> anyhow::Result<u64> {
        let query = format!("SELECT count(1) FROM {}", quote_identifier(table));
        return Ok(self.connection.query_row(&query, [], |row| row.get(0))?);
    }

    fn get_columns(&mut self, table: &str) -> anyhow::Result<Vec<Column>> {
        let mut stmt = self
            .connection
            .prepare("SELECT name, type, \"notnull\" FROM pragma_table_info(?1) ORDER BY cid")
            .context("Failed to query information about table")?;
        let mut rows = stmt.query([table])?;
        let mut columns = Vec::new();
        while let Some(row) = rows.next()? {
            let name: String = row.get(0)?;
            let declared: String = row.get(1)?;
            let notnull: bool = row.get(2)?;
            let column_type = ColumnType::from_declared(&declared);
            if column_type == ColumnType::Unsupported {
                debug!("Column {table}.{name} has unsupported type {declared}");
            }
            columns.push(Column {
                column_type,
                name,
                nullable: !notnull,
            });
        }
        return Ok(columns);
    }
}

impl DBInfoProvider for SqliteDB {
    fn table_exists(&mut self, table: &str) -> anyhow::Result<bool> {
        return self
            .connection
            .query_row(
                "SELECT EXISTS (SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
                [table],
                |row| row.get(0),
            )
            .context("Failed to check if table exists");
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
        let mut stmt = self.connection.prepare(
            "SELECT name FROM sqlite_master
            WHERE type = 'table' AND name NOT LIKE 'sqlite_%'
            ORDER BY name",
        )?;
        let tables = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()
            .context("Failed to list tables")?;
        return Ok(tables);
    }
}

/// Statement and its rows kept together, so rows stream one at a time.
#[ouroboros::self_referencing]
struct SqliteRowsIter<'conn> {
    column_count: usize,
    stmt: Statement<'conn>,
    #[borrows(mut stmt)]
    #[covariant]
    rows: Rows<'this>,
}

impl Iterator for SqliteRowsIter<'_> {
    type Item = anyhow::Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let column_count = *self.borrow_column_count();
        return self.with_rows_mut(|rows| {
            let row = match rows.next().context("Failed to read row") {
                Ok(Some(row)) => row,
                Ok(None) => return None,
                Err(err) => return Some(Err(err)),
            };
            let mut values: Row = Vec::with_capacity(column_count);
            for idx in 0..column_count {
                let value = row
                    .get_ref(idx)
                    .context("Failed to read value")
                    .and_then(Value::try_from);
                match value {
                    Ok(value) => values.push(value),
                    Err(err) => return Some(Err(err)),
                }
            }
            return Some(Ok(values));
        });
    }
}

impl DBReader for SqliteDB {
    fn read_iter(&mut self, target_format: TableInfo) -> anyhow::Result<ReaderIterator<'_>> {
        let query = format!(
            "SELECT {} FROM {}",
            target_format.quoted_column_list(),
            quote_identifier(&target_format.name)
        );
        let stmt = self
            .connection
            .prepare(&query)
            .context("Failed to create read query")?;
        let iter = SqliteRowsIterTryBuilder {
            column_count: stmt.column_count(),
            stmt,
            rows_builder: |stmt| stmt.query([]),
        }
        .try_build()
        .context("Failed to read rows")?;
        return Ok(Box::new(iter));
    }
}

fn write_batch(
    transaction: &rusqlite::Transaction<'_>,
    batch: &[Row],
    table: &str,
    column_list: &str,
) -> anyhow::Result<()> {
    let placeholder = format!(
        "({})",
        itertools::join(batch[0].iter().map(|_| "?"), ", ")
    );
    let placeholders = itertools::join(batch.iter().map(|_| placeholder.as_str()), ", ");
    let query = format!("INSERT INTO {table} ({column_list}) VALUES {placeholders}");
    let mut stmt = transaction
        .prepare(&query)
        .context("Failed to create write query")?;
    stmt.execute(params_from_iter(batch.iter().flatten()))
        .context("Failed to write data")?;
    return Ok(());
}

// SQLite caps the number of bound parameters per statement
const MAX_VARIABLES: usize = 32_766;

impl DBWriter for SqliteDB {
    fn replace_rows(
        &mut self,
        target_format: &TableInfo,
        rows: ReaderIterator<'_>,
        batch_size: usize,
    ) -> anyhow::Result<u64> {
        let table = quote_identifier(&target_format.name);
        let column_list = target_format.quoted_column_list();
        let batch_size = batch_size
            .min(MAX_VARIABLES / target_format.columns.len().max(1))
            .max(1);

        // Dropping the transaction on any early return rolls it back
        let transaction = self
            .connection
            .transaction()
            .context("Failed to start transaction")?;
        transaction
            .execute(&format!("DELETE FROM {table}"), [])
            .context("Failed to clear destination table")?;

        let mut written: u64 = 0;
        let mut batch: Vec<Row> = Vec::with_capacity(batch_size);
        for row in rows {
            batch.push(row?);
            if batch.len() == batch_size {
                write_batch(&transaction, &batch, &table, &column_list)?;
                written += u64::try_from(batch.len())?;
                batch.clear();
            }
        }
        if !batch.is_empty() {
            write_batch(&transaction, &batch, &table, &column_list)?;
            written += u64::try_from(batch.len())?;
        }
        transaction
            .commit()
            .context("Failed to commit destination table")?;
        return Ok(written);
    }
}
