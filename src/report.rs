use std::collections::BTreeSet;
use std::fmt::Display;

use num_format::{Locale, ToFormattedString};
use tracing::{error, info, warn};

#[derive(Clone, Debug, PartialEq)]
pub enum SkipReason {
    Unmapped,
    SourceMissing,
    DestinationMissing,
    NoCommonColumns,
}

impl Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let reason = match self {
            SkipReason::Unmapped => "no destination in the name mapping",
            SkipReason::SourceMissing => "source table does not exist",
            SkipReason::DestinationMissing => "destination table does not exist",
            SkipReason::NoCommonColumns => "no common columns",
        };
        return f.write_str(reason);
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum TableOutcome {
    Copied { rows: u64 },
    /// Dry run: the table would be copied, `rows` is the source row count.
    Checked { rows: u64 },
    Skipped { reason: SkipReason },
    Failed { error: String },
}

/// Outcome of migrating one table. Built once, when the table is done.
#[derive(Clone, Debug, PartialEq)]
pub struct RunResult {
    pub source_table: String,
    pub destination_table: Option<String>,
    pub outcome: TableOutcome,
}

impl RunResult {
    pub fn new(source_table: &str, destination_table: Option<&str>, outcome: TableOutcome) -> Self {
        return Self {
            source_table: source_table.to_string(),
            destination_table: destination_table.map(str::to_string),
            outcome,
        };
    }

    pub fn rows_copied(&self) -> u64 {
        return match self.outcome {
            TableOutcome::Copied { rows } => rows,
            _ => 0,
        };
    }

    pub fn skipped(&self) -> bool {
        return matches!(self.outcome, TableOutcome::Skipped { .. });
    }

    pub fn error(&self) -> Option<&str> {
        return match &self.outcome {
            TableOutcome::Failed { error } => Some(error.as_str()),
            _ => None,
        };
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct MigrationReport {
    pub results: Vec<RunResult>,
}

impl MigrationReport {
    pub fn push(&mut self, result: RunResult) {
        self.results.push(result);
    }

    pub fn total_rows_copied(&self) -> u64 {
        return self.results.iter().map(RunResult::rows_copied).sum();
    }

    pub fn skipped(&self) -> impl Iterator<Item = &RunResult> {
        return self.results.iter().filter(|r| r.skipped());
    }

    pub fn failed(&self) -> impl Iterator<Item = &RunResult> {
        return self.results.iter().filter(|r| r.error().is_some());
    }

    /// Distinct source names that had no destination in the mapping.
    pub fn unmapped_names(&self) -> BTreeSet<&str> {
        return self
            .results
            .iter()
            .filter(|r| r.outcome == TableOutcome::Skipped { reason: SkipReason::Unmapped })
            .map(|r| r.source_table.as_str())
            .collect();
    }

    pub fn has_errors(&self) -> bool {
        return self.failed().next().is_some();
    }

    pub fn log_summary(&self) {
        info!(
            "Migration complete. Total rows migrated: {}",
            self.total_rows_copied().to_formatted_string(&Locale::en)
        );
        for result in &self.results {
            let destination = result.destination_table.as_deref().unwrap_or("-");
            match &result.outcome {
                TableOutcome::Copied { rows } => info!(
                    "{} -> {destination}: {} rows",
                    result.source_table,
                    rows.to_formatted_string(&Locale::en)
                ),
                TableOutcome::Checked { rows } => info!(
                    "{} -> {destination}: would copy {} rows",
                    result.source_table,
                    rows.to_formatted_string(&Locale::en)
                ),
                TableOutcome::Skipped { reason } => {
                    warn!("{} -> {destination}: skipped, {reason}", result.source_table)
                }
                TableOutcome::Failed { error } => {
                    error!("{} -> {destination}: failed, {error}", result.source_table)
                }
            }
        }
        let unmapped = self.unmapped_names();
        if !unmapped.is_empty() {
            warn!(
                "Skipped {} unmapped names: {}",
                unmapped.len(),
                itertools::join(&unmapped, ", ")
            );
        }
        let failed = self.failed().count();
        if failed > 0 {
            error!("{failed} tables failed");
        }
    }
}
