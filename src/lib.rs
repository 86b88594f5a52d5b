use anyhow::Context;
use tracing::info;

pub mod args;
pub mod config;
pub mod databases;
pub mod error;
pub mod labels;
pub mod mapping;
pub mod migrator;
pub mod progress;
pub mod reconcile;
pub mod report;
pub mod table_migrator;
pub mod uri;

/// Copies every configured table. Only configuration and connection
/// problems are returned as errors, per-table failures are in the report.
pub fn run(args: args::Args) -> anyhow::Result<report::MigrationReport> {
    let config = args.load_config()?;
    let mapping = args
        .table_mapping(&config)
        .context("Invalid table name mapping")?;
    let tables = args.tables(&config, &mapping);
    let reader = args
        .input_uri(&config)?
        .create_reader()
        .context("Unable to open source database")?;
    let writer = args
        .output_uri(&config)?
        .create_writer()
        .context("Unable to open destination database")?;

    let mut migrator = migrator::Migrator::new(reader, writer, mapping, args.copy_options());
    let report = migrator.run(&tables);
    report.log_summary();
    return Ok(report);
}

pub fn adjust_labels(args: args::LabelArgs) -> anyhow::Result<labels::Adjustment> {
    let config = args.load_config()?;
    let mapping = args
        .label_mapping(&config)
        .context("Invalid model path mapping")?;
    let policy = args.unmapped_policy(&config);
    return labels::adjust_file(&args.input_file, &args.output_file, &mapping, policy);
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableListing {
    pub source: Vec<String>,
    pub destination: Vec<String>,
}

pub fn list_tables(args: args::ListArgs) -> anyhow::Result<TableListing> {
    let config = args.load_config()?;
    let mut reader = args
        .input_uri(&config)?
        .create_reader()
        .context("Unable to open source database")?;
    let mut writer = args
        .output_uri(&config)?
        .create_writer()
        .context("Unable to open destination database")?;
    let matches = |tables: Vec<String>| -> Vec<String> {
        return tables
            .into_iter()
            .filter(|table| table.contains(&args.pattern))
            .collect();
    };
    let listing = TableListing {
        source: matches(reader.get_tables()?),
        destination: matches(writer.get_tables()?),
    };
    info!(
        "Found {} source and {} destination tables matching {}",
        listing.source.len(),
        listing.destination.len(),
        args.pattern
    );
    return Ok(listing);
}
