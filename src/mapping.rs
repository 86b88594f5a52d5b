//! Versioned mapping from legacy qualified names (physical tables or dotted
//! model paths) to their names in the new schema generation.

use std::collections::HashMap;
use std::str::FromStr;

use crate::error::Error;

/// Xero entities in foreign key order, with the app they moved to in v3.
/// Parents come first: tenant, credentials, tokens, then business data.
const XERO_ENTITIES: [(&str, &str); 16] = [
    ("xero_core", "xerotenant"),
    ("xero_auth", "xeroclientcredentials"),
    ("xero_auth", "xerotenanttoken"),
    ("xero_auth", "xeroauthsettings"),
    ("xero_sync", "xerolastupdate"),
    ("xero_sync", "xerotenantschedule"),
    ("xero_sync", "xerotaskexecutionlog"),
    ("xero_metadata", "xerobusinessunits"),
    ("xero_metadata", "xeroaccount"),
    ("xero_metadata", "xerotracking"),
    ("xero_metadata", "xerocontacts"),
    ("xero_data", "xerotransactionsource"),
    ("xero_data", "xerojournalssource"),
    ("xero_data", "xerojournals"),
    ("xero_cube", "xerotrailbalance"),
    ("xero_cube", "xerobalancesheet"),
];

#[derive(Clone, Debug, PartialEq)]
pub struct NameMapping {
    version: String,
    pairs: Vec<(String, String)>,
    index: HashMap<String, usize>,
}

impl NameMapping {
    /// Fails if a source key appears more than once.
    pub fn new(
        version: impl Into<String>,
        pairs: impl IntoIterator<Item = (String, String)>,
    ) -> Result<Self, Error> {
        let pairs: Vec<(String, String)> = pairs.into_iter().collect();
        let mut index = HashMap::with_capacity(pairs.len());
        for (position, (source, _)) in pairs.iter().enumerate() {
            if index.insert(source.clone(), position).is_some() {
                return Err(Error::DuplicateMappingKey(source.clone()));
            }
        }
        return Ok(Self {
            version: version.into(),
            pairs,
            index,
        });
    }

    /// Physical table names: `xero_<model>` -> `<app>_<model>`.
    pub fn xero_v2_to_v3_tables() -> Self {
        return Self::from_entities("xero-tables-v2-to-v3", |app, model| {
            (format!("xero_{model}"), format!("{app}_{model}"))
        });
    }

    /// Dotted model paths: `apps.xero.<model>` -> `apps.xero.<app>.<model>`.
    pub fn xero_v2_to_v3_models() -> Self {
        return Self::from_entities("xero-models-v2-to-v3", |app, model| {
            (format!("apps.xero.{model}"), format!("apps.xero.{app}.{model}"))
        });
    }

    fn from_entities(version: &str, pair: impl Fn(&str, &str) -> (String, String)) -> Self {
        let pairs: Vec<(String, String)> = XERO_ENTITIES
            .iter()
            .map(|(app, model)| pair(app, model))
            .collect();
        let index = pairs
            .iter()
            .enumerate()
            .map(|(position, (source, _))| (source.clone(), position))
            .collect();
        return Self {
            version: version.to_string(),
            pairs,
            index,
        };
    }

    pub fn resolve(&self, source: &str) -> Option<&str> {
        return self
            .index
            .get(source)
            .map(|&position| self.pairs[position].1.as_str());
    }

    pub fn version(&self) -> &str {
        return &self.version;
    }

    pub fn pairs(&self) -> &[(String, String)] {
        return &self.pairs;
    }

    /// Source keys in mapping order.
    pub fn source_keys(&self) -> Vec<String> {
        return self.pairs.iter().map(|(source, _)| source.clone()).collect();
    }

    pub fn len(&self) -> usize {
        return self.pairs.len();
    }

    pub fn is_empty(&self) -> bool {
        return self.pairs.is_empty();
    }
}

/// `SOURCE=DESTINATION` pair given on the command line.
#[derive(Clone, Debug, PartialEq)]
pub struct MappingPair {
    pub source: String,
    pub destination: String,
}

impl FromStr for MappingPair {
    type Err = Error;

    fn from_str(s: &str) -> Result<MappingPair, Self::Err> {
        return match s.split_once('=') {
            Some((source, destination)) if !source.is_empty() && !destination.is_empty() => {
                Ok(MappingPair {
                    source: source.to_string(),
                    destination: destination.to_string(),
                })
            }
            _ => Err(Error::InvalidMappingPair(s.to_string())),
        };
    }
}

impl From<MappingPair> for (String, String) {
    fn from(value: MappingPair) -> Self {
        return (value.source, value.destination);
    }
}
