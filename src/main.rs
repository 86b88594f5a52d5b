use std::process::ExitCode;

use clap::Parser;
use schema_remap::args::{Cli, Command};

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Copy(args) => {
            let report = schema_remap::run(args)?;
            if report.has_errors() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Command::AdjustLabels(args) => {
            schema_remap::adjust_labels(args)?;
        }
        Command::ListTables(args) => {
            let listing = schema_remap::list_tables(args)?;
            println!("=== Source tables ===");
            for table in &listing.source {
                println!("  {table}");
            }
            println!("\n=== Destination tables ===");
            for table in &listing.destination {
                println!("  {table}");
            }
        }
    }
    return Ok(ExitCode::SUCCESS);
}
