use tracing::{info, warn};

use crate::{
    databases::traits::{DBReader, DBWriter},
    mapping::NameMapping,
    report::{MigrationReport, RunResult, SkipReason, TableOutcome},
    table_migrator::{CopyOptions, TableMigrator},
};

/// Moves tables one at a time, in the given order, from the source store to
/// the destination store. The order is the only thing keeping foreign keys
/// satisfied: parents must come before their children.
pub struct Migrator {
    reader: Box<dyn DBReader>,
    writer: Box<dyn DBWriter>,
    mapping: NameMapping,
    options: CopyOptions,
}

impl Migrator {
    pub fn new(
        reader: Box<dyn DBReader>,
        writer: Box<dyn DBWriter>,
        mapping: NameMapping,
        options: CopyOptions,
    ) -> Self {
        return Self {
            reader,
            writer,
            mapping,
            options,
        };
    }

    pub fn run(&mut self, tables: &[String]) -> MigrationReport {
        info!(
            "Migrating {} tables with mapping {}",
            tables.len(),
            self.mapping.version()
        );
        let mut report = MigrationReport::default();
        for source_table in tables {
            let result = match self.mapping.resolve(source_table) {
                Some(destination_table) => {
                    TableMigrator::new(source_table, destination_table, &self.options)
                        .run(self.reader.as_mut(), self.writer.as_mut())
                }
                None => {
                    warn!("No destination for {source_table} in the name mapping, skipping");
                    RunResult::new(
                        source_table,
                        None,
                        TableOutcome::Skipped {
                            reason: SkipReason::Unmapped,
                        },
                    )
                }
            };
            report.push(result);
        }
        return report;
    }
}
