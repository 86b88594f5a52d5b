use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::Level;

use crate::config::{Config, StoreConfig};
use crate::error::Error;
use crate::labels::UnmappedPolicy;
use crate::mapping::{MappingPair, NameMapping};
use crate::table_migrator::CopyOptions;
use crate::uri::URI;

#[derive(Parser)]
#[command(version, about, long_about = None)]
#[command(next_line_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Log level
    #[arg(long, global = true, default_value_t = Level::INFO)]
    pub log_level: Level,
}

#[derive(Subcommand)]
pub enum Command {
    /// Copy tables from the source database into the renamed tables of the
    /// destination database
    Copy(Args),
    /// Rewrite model paths of a JSON object dump
    AdjustLabels(LabelArgs),
    /// List tables of both databases to verify a mapping
    ListTables(ListArgs),
}

#[derive(clap::Args, Clone, Debug)]
pub struct Args {
    /// Input URI of database. Overrides [source] of the config file
    #[arg(long, short)]
    pub input: Option<URI>,

    /// Output URI of database. Overrides [destination] of the config file
    #[arg(long, short)]
    pub output: Option<URI>,

    /// Path to the TOML config file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Source tables to migrate, in order. Defaults to the config order,
    /// then to the mapping order
    #[arg(long, short)]
    pub table: Vec<String>,

    /// Additional SOURCE=DESTINATION table name pair
    #[arg(long = "map")]
    pub map: Vec<MappingPair>,

    /// Size of batches used by writer
    #[arg(long, default_value_t = 10_000)]
    pub batch_write_size: usize,

    /// Check tables and columns without moving data
    #[clap(long, action)]
    pub dry_run: bool,

    /// Disable progress output
    #[clap(long, action)]
    pub quiet: bool,
}

impl Args {
    pub fn new(input: URI, output: URI) -> Self {
        return Args {
            input: Some(input),
            output: Some(output),
            config: None,
            table: Vec::new(),
            map: Vec::new(),
            batch_write_size: 10_000,
            dry_run: false,
            quiet: true,
        };
    }

    pub fn load_config(&self) -> anyhow::Result<Config> {
        return load_config(self.config.as_ref());
    }

    pub fn copy_options(&self) -> CopyOptions {
        return CopyOptions {
            batch_write_size: self.batch_write_size.max(1),
            dry_run: self.dry_run,
            quiet: self.quiet,
        };
    }

    /// Config mapping extended with `--map` pairs, or the built-in Xero
    /// table mapping when neither is given.
    pub fn table_mapping(&self, config: &Config) -> Result<NameMapping, Error> {
        return merge_mapping(
            config.table_mapping()?,
            &self.map,
            NameMapping::xero_v2_to_v3_tables,
        );
    }

    pub fn tables(&self, config: &Config, mapping: &NameMapping) -> Vec<String> {
        if !self.table.is_empty() {
            return self.table.clone();
        }
        if !config.order.is_empty() {
            return config.order.clone();
        }
        return mapping.source_keys();
    }

    pub fn input_uri(&self, config: &Config) -> anyhow::Result<URI> {
        return resolve_uri(self.input.as_ref(), config.source.as_ref(), "source", "--input");
    }

    pub fn output_uri(&self, config: &Config) -> anyhow::Result<URI> {
        return resolve_uri(
            self.output.as_ref(),
            config.destination.as_ref(),
            "destination",
            "--output",
        );
    }
}

#[derive(clap::Args, Clone, Debug)]
pub struct LabelArgs {
    /// JSON dump produced from the old schema
    #[arg(default_value = "/tmp/v2_xero_all.json")]
    pub input_file: PathBuf,

    /// Where to write the adjusted dump
    #[arg(default_value = "/tmp/v3_xero_data.json")]
    pub output_file: PathBuf,

    /// Path to the TOML config file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// What to do with objects of unmapped models. Overrides the config file
    #[arg(long, value_enum)]
    pub unmapped: Option<UnmappedPolicy>,

    /// Additional SOURCE=DESTINATION model path pair
    #[arg(long = "map")]
    pub map: Vec<MappingPair>,
}

impl LabelArgs {
    pub fn new(input_file: PathBuf, output_file: PathBuf) -> Self {
        return LabelArgs {
            input_file,
            output_file,
            config: None,
            unmapped: None,
            map: Vec::new(),
        };
    }

    pub fn load_config(&self) -> anyhow::Result<Config> {
        return load_config(self.config.as_ref());
    }

    pub fn label_mapping(&self, config: &Config) -> Result<NameMapping, Error> {
        return merge_mapping(
            config.label_mapping()?,
            &self.map,
            NameMapping::xero_v2_to_v3_models,
        );
    }

    pub fn unmapped_policy(&self, config: &Config) -> UnmappedPolicy {
        return self
            .unmapped
            .or_else(|| config.labels.as_ref().and_then(|labels| labels.unmapped))
            .unwrap_or_default();
    }
}

#[derive(clap::Args, Clone, Debug)]
pub struct ListArgs {
    /// Input URI of database. Overrides [source] of the config file
    #[arg(long, short)]
    pub input: Option<URI>,

    /// Output URI of database. Overrides [destination] of the config file
    #[arg(long, short)]
    pub output: Option<URI>,

    /// Path to the TOML config file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Only list tables containing this text
    #[arg(long, default_value = "xero")]
    pub pattern: String,
}

impl ListArgs {
    pub fn load_config(&self) -> anyhow::Result<Config> {
        return load_config(self.config.as_ref());
    }

    pub fn input_uri(&self, config: &Config) -> anyhow::Result<URI> {
        return resolve_uri(self.input.as_ref(), config.source.as_ref(), "source", "--input");
    }

    pub fn output_uri(&self, config: &Config) -> anyhow::Result<URI> {
        return resolve_uri(
            self.output.as_ref(),
            config.destination.as_ref(),
            "destination",
            "--output",
        );
    }
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    return match path {
        Some(path) => Config::load(path),
        None => Ok(Config::default()),
    };
}

fn resolve_uri(
    uri: Option<&URI>,
    store: Option<&StoreConfig>,
    section: &str,
    flag: &str,
) -> anyhow::Result<URI> {
    if let Some(uri) = uri {
        return Ok(uri.clone());
    }
    return store
        .with_context(|| format!("No {section} database given, use {flag} or [{section}] in config"))?
        .to_uri()
        .with_context(|| format!("Invalid [{section}] in config"));
}

fn merge_mapping(
    configured: Option<NameMapping>,
    extra: &[MappingPair],
    preset: fn() -> NameMapping,
) -> Result<NameMapping, Error> {
    if extra.is_empty() {
        return Ok(configured.unwrap_or_else(preset));
    }
    let (version, mut pairs) = match configured {
        Some(mapping) => (mapping.version().to_string(), mapping.pairs().to_vec()),
        None => ("command-line".to_string(), Vec::new()),
    };
    pairs.extend(extra.iter().cloned().map(<(String, String)>::from));
    return NameMapping::new(version, pairs);
}
