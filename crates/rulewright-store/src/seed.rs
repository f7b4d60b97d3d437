//! Loading seed exemplars from disk
//!
//! A seed file is a JSON object `{"ruleText": ..., "compiledDocument": ...}`
//! where the document is either a JSON object or a string holding one.

use crate::StoreError;
use rulewright_domain::Exemplar;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedFile {
    rule_text: String,
    compiled_document: serde_json::Value,
}

/// Parse one seed exemplar from JSON text
pub fn parse_seed(json: &str) -> Result<Exemplar, StoreError> {
    let seed: SeedFile = serde_json::from_str(json)?;
    if seed.rule_text.trim().is_empty() {
        return Err(StoreError::InvalidData("Seed has empty ruleText".to_string()));
    }

    let document = match seed.compiled_document {
        serde_json::Value::String(text) => text,
        value @ serde_json::Value::Object(_) => serde_json::to_string_pretty(&value)?,
        other => {
            return Err(StoreError::InvalidData(format!(
                "compiledDocument must be an object or a string, got {}",
                other
            )))
        }
    };

    Ok(Exemplar::new(seed.rule_text, document))
}

/// Load every `*.json` seed file in `dir`, ordered by file name
///
/// Files that fail to parse are skipped with a warning.
pub fn load_seed_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<Exemplar>, StoreError> {
    let mut paths: Vec<_> = fs::read_dir(dir.as_ref())?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map_or(false, |ext| ext == "json"))
        .collect();
    paths.sort();

    let mut exemplars = Vec::new();
    for path in paths {
        let contents = fs::read_to_string(&path)?;
        match parse_seed(&contents) {
            Ok(exemplar) => {
                debug!("Loaded seed {}", path.display());
                exemplars.push(exemplar);
            }
            Err(e) => warn!("Skipping seed {}: {}", path.display(), e),
        }
    }

    Ok(exemplars)
}
