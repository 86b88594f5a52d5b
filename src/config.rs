//! TOML configuration of a migration run.
//!
//! ```toml
//! order = ["xero_xerotenant", "xero_xeroclientcredentials"]
//!
//! [source]
//! host = "127.0.0.1"
//! database = "klikk_bi"
//! user = "mc"
//! credential_reference = "V2_DATABASE_PASSWORD"
//!
//! [destination]
//! uri = "postgresql://mc@127.0.0.1/klikk_bi_v3"
//!
//! [mapping]
//! version = "tables-v2-to-v3"
//! entries = [
//!     { source = "xero_xerotenant", destination = "xero_core_xerotenant" },
//! ]
//!
//! [labels]
//! unmapped = "keep"
//! ```
//!
//! Passwords are never part of the file: `credential_reference` names the
//! environment variable that holds it.

use std::path::Path;
use std::str::FromStr;

use anyhow::Context;
use serde::Deserialize;

use crate::error::Error;
use crate::labels::UnmappedPolicy;
use crate::mapping::NameMapping;
use crate::uri::URI;

#[derive(Deserialize, Debug, Clone, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub source: Option<StoreConfig>,
    pub destination: Option<StoreConfig>,
    /// Tables in foreign key order, parents first.
    #[serde(default)]
    pub order: Vec<String>,
    pub mapping: Option<MappingConfig>,
    pub labels: Option<LabelsConfig>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(untagged)]
pub enum StoreConfig {
    Uri { uri: String },
    Params(ConnectionParams),
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ConnectionParams {
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub database: String,
    pub user: String,
    pub credential_reference: Option<String>,
}

fn default_port() -> u16 {
    5432
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MappingConfig {
    pub version: String,
    pub entries: Vec<MappingEntry>,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MappingEntry {
    pub source: String,
    pub destination: String,
}

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LabelsConfig {
    pub unmapped: Option<UnmappedPolicy>,
    pub mapping: Option<MappingConfig>,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Unable to read config file {}", path.display()))?;
        return Config::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()));
    }

    pub fn table_mapping(&self) -> Result<Option<NameMapping>, Error> {
        return self.mapping.as_ref().map(MappingConfig::build).transpose();
    }

    pub fn label_mapping(&self) -> Result<Option<NameMapping>, Error> {
        return self
            .labels
            .as_ref()
            .and_then(|labels| labels.mapping.as_ref())
            .map(MappingConfig::build)
            .transpose();
    }
}

impl FromStr for Config {
    type Err = toml::de::Error;

    fn from_str(s: &str) -> Result<Config, Self::Err> {
        return toml::from_str(s);
    }
}

impl MappingConfig {
    pub fn build(&self) -> Result<NameMapping, Error> {
        return NameMapping::new(
            self.version.clone(),
            self.entries
                .iter()
                .map(|entry| (entry.source.clone(), entry.destination.clone())),
        );
    }
}

impl StoreConfig {
    pub fn to_uri(&self) -> anyhow::Result<URI> {
        return self.to_uri_with(|name| std::env::var(name).ok());
    }

    pub fn to_uri_with(&self, lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<URI> {
        return match self {
            StoreConfig::Uri { uri } => Ok(URI::from_str(uri)?),
            StoreConfig::Params(params) => Ok(URI::Postgres(params.connection_string(lookup)?)),
        };
    }
}

impl ConnectionParams {
    /// libpq style `key='value'` connection string.
    pub fn connection_string(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<String, Error> {
        let mut parts = vec![
            format!("host={}", quote_value(&self.host)),
            format!("port={}", self.port),
            format!("dbname={}", quote_value(&self.database)),
            format!("user={}", quote_value(&self.user)),
        ];
        if let Some(reference) = &self.credential_reference {
            let password =
                lookup(reference).ok_or_else(|| Error::MissingCredential(reference.clone()))?;
            parts.push(format!("password={}", quote_value(&password)));
        }
        return Ok(parts.join(" "));
    }
}

fn quote_value(value: &str) -> String {
    return format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"));
}
