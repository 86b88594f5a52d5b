//! Model path rewriting for serialized object dumps (`dumpdata` style JSON
//! arrays of `{"model", "pk", "fields"}` objects).

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::Context;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::mapping::NameMapping;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SerializedObject {
    pub model: String,
    #[serde(default)]
    pub pk: serde_json::Value,
    #[serde(default)]
    pub fields: serde_json::Map<String, serde_json::Value>,
    /// Any other top level keys, written back untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// What happens to objects whose model has no destination.
#[derive(Deserialize, ValueEnum, Debug, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UnmappedPolicy {
    #[default]
    Drop,
    Keep,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Adjustment {
    pub records: Vec<SerializedObject>,
    /// Number of records whose model was rewritten.
    pub adjusted: usize,
    pub unmapped_models: BTreeSet<String>,
}

fn resolve<'a>(mapping: &'a NameMapping, model: &str) -> Option<&'a str> {
    return mapping
        .resolve(model)
        .or_else(|| mapping.resolve(&model.to_lowercase()));
}

/// Rewrites the `model` of every record found in `mapping` to its lowercase
/// destination path. Unmapped records are dropped or kept unchanged
/// according to `policy`, and reported either way.
pub fn adjust(
    records: Vec<SerializedObject>,
    mapping: &NameMapping,
    policy: UnmappedPolicy,
) -> Adjustment {
    let mut result = Adjustment {
        records: Vec::with_capacity(records.len()),
        ..Default::default()
    };
    for mut record in records {
        match resolve(mapping, &record.model) {
            Some(destination) => {
                record.model = destination.to_lowercase();
                result.adjusted += 1;
                result.records.push(record);
            }
            None => {
                result.unmapped_models.insert(record.model.clone());
                if policy == UnmappedPolicy::Keep {
                    result.records.push(record);
                }
            }
        }
    }
    return result;
}

/// Reads the whole dump from `input`, adjusts it and writes it to `output`.
pub fn adjust_file(
    input: &Path,
    output: &Path,
    mapping: &NameMapping,
    policy: UnmappedPolicy,
) -> anyhow::Result<Adjustment> {
    info!("Reading {}", input.display());
    let content = std::fs::read_to_string(input)
        .with_context(|| format!("Unable to read {}", input.display()))?;
    let records: Vec<SerializedObject> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid object dump in {}", input.display()))?;
    info!("Found {} objects", records.len());

    let adjustment = adjust(records, mapping, policy);
    info!("Adjusted {} objects", adjustment.adjusted);
    if !adjustment.unmapped_models.is_empty() {
        warn!(
            "{} {} unknown models: {}",
            match policy {
                UnmappedPolicy::Drop => "Skipped",
                UnmappedPolicy::Keep => "Kept unchanged",
            },
            adjustment.unmapped_models.len(),
            itertools::join(&adjustment.unmapped_models, ", ")
        );
    }

    info!("Writing to {}", output.display());
    let json = serde_json::to_string_pretty(&adjustment.records)?;
    std::fs::write(output, json)
        .with_context(|| format!("Unable to write {}", output.display()))?;
    return Ok(adjustment);
}
