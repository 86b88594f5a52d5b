use anyhow::Context;
use tracing::{debug, error, info, warn};

use crate::{
    databases::{
        table::TableInfo,
        traits::{DBReader, DBWriter, ReaderIterator},
    },
    progress::CopyProgress,
    reconcile::{reconcile, type_mismatches, unsupported_columns},
    report::{RunResult, SkipReason, TableOutcome},
};

#[derive(Clone, Debug)]
pub struct CopyOptions {
    pub batch_write_size: usize,
    pub dry_run: bool,
    pub quiet: bool,
}

impl Default for CopyOptions {
    fn default() -> Self {
        return Self {
            batch_write_size: 10_000,
            dry_run: false,
            quiet: true,
        };
    }
}

/// Copies one source table into its renamed destination table.
pub struct TableMigrator<'a> {
    source_table: &'a str,
    destination_table: &'a str,
    options: &'a CopyOptions,
}

impl<'a> TableMigrator<'a> {
    pub fn new(source_table: &'a str, destination_table: &'a str, options: &'a CopyOptions) -> Self {
        return Self {
            source_table,
            destination_table,
            options,
        };
    }

    /// Never fails: errors end up in the returned result, after the
    /// destination transaction was rolled back.
    pub fn run(self, reader: &mut dyn DBReader, writer: &mut dyn DBWriter) -> RunResult {
        info!("Migrating {} -> {}", self.source_table, self.destination_table);
        let outcome = match self.copy(reader, writer) {
            Ok(TableOutcome::Skipped { reason }) => {
                warn!("Skipping {}: {reason}", self.source_table);
                TableOutcome::Skipped { reason }
            }
            Ok(outcome) => outcome,
            Err(err) => {
                error!(
                    "Failed to migrate {} -> {}: {err:?}",
                    self.source_table, self.destination_table
                );
                TableOutcome::Failed {
                    error: format!("{err:#}"),
                }
            }
        };
        return RunResult::new(self.source_table, Some(self.destination_table), outcome);
    }

    fn copy(
        &self,
        reader: &mut dyn DBReader,
        writer: &mut dyn DBWriter,
    ) -> anyhow::Result<TableOutcome> {
        if !reader
            .table_exists(self.source_table)
            .context("Unable to check source table")?
        {
            return Ok(skipped(SkipReason::SourceMissing));
        }
        if !writer
            .table_exists(self.destination_table)
            .context("Unable to check destination table")?
        {
            return Ok(skipped(SkipReason::DestinationMissing));
        }

        let source_info = reader
            .get_table_info(self.source_table, false)
            .context("Unable to get information about source table")?;
        let destination_info = writer
            .get_table_info(self.destination_table, true)
            .context("Unable to get information about destination table")?;

        let columns = reconcile(&source_info, &destination_info);
        if columns.is_empty() {
            return Ok(skipped(SkipReason::NoCommonColumns));
        }
        debug!(
            "Common columns of {}: {}",
            self.source_table,
            itertools::join(columns.iter().map(|c| c.name.as_str()), ", ")
        );
        let unsupported = unsupported_columns(&columns, &destination_info);
        if !unsupported.is_empty() {
            anyhow::bail!(
                "Unsupported type of common columns: {}",
                itertools::join(unsupported, ", ")
            );
        }
        for mismatch in type_mismatches(&columns, &destination_info) {
            warn!(
                "Column {}.{} is {:?} in source and {:?} in destination",
                self.source_table, mismatch.column, mismatch.source, mismatch.destination
            );
        }

        let num_rows = source_info.num_rows;
        if self.options.dry_run {
            return Ok(TableOutcome::Checked {
                rows: num_rows.unwrap_or_default(),
            });
        }

        let target_format = TableInfo {
            name: self.destination_table.to_string(),
            num_rows: None,
            columns: columns.clone(),
        };
        let progress = CopyProgress::new(self.source_table, num_rows, self.options.quiet);
        let rows = reader
            .read_iter(source_info.project(columns))
            .context("Unable to read source table")?;
        let rows: ReaderIterator<'_> = Box::new(rows.inspect(|row| {
            if row.is_ok() {
                progress.add_rows(1);
            }
        }));
        let written = writer
            .replace_rows(&target_format, rows, self.options.batch_write_size)
            .context("Unable to write destination table")?;
        info!(
            "Migrated {written} rows {} -> {}",
            self.source_table, self.destination_table
        );
        return Ok(TableOutcome::Copied { rows: written });
    }
}

fn skipped(reason: SkipReason) -> TableOutcome {
    return TableOutcome::Skipped { reason };
}
