use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use af_core::Rule;

#[derive(Debug, thiserror::Error)]
pub enum BundleError {
    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Rule file has no 'rules' list")]
    MissingRules,
}

/// An exported rule file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleBundle {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<String>,
    pub rules: Vec<Rule>,
}

/// A record of the `rules` list that is not a readable rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRecord {
    pub index: usize,
    pub reason: String,
}

impl fmt::Display for SkippedRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule #{} skipped: {}", self.index, self.reason)
    }
}

/// Result of reading a rule file: the usable rules plus what was left out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedRules {
    pub bundle: RuleBundle,
    pub skipped: Vec<SkippedRecord>,
}

/// Parse an exported rule file.
///
/// The document must be an object with a `rules` array. Records that do not
/// decode into a rule are skipped and reported; they never fail the import.
/// Other top-level fields are optional.
pub fn parse_rule_bundle(text: &str) -> Result<ImportedRules, BundleError> {
    let document: Value = serde_json::from_str(text)?;

    let records = match document.get("rules") {
        Some(Value::Array(records)) => records,
        _ => return Err(BundleError::MissingRules),
    };

    let mut rules = Vec::with_capacity(records.len());
    let mut skipped = Vec::new();
    for (index, record) in records.iter().enumerate() {
        match Rule::deserialize(record) {
            Ok(rule) => rules.push(rule),
            Err(e) => {
                log::warn!("Skipping rule #{} of import: {}", index, e);
                skipped.push(SkippedRecord {
                    index,
                    reason: e.to_string(),
                });
            }
        }
    }

    let text_field = |key: &str| document.get(key).and_then(Value::as_str).map(str::to_string);

    Ok(ImportedRules {
        bundle: RuleBundle {
            version: text_field("version"),
            exported_at: text_field("exportedAt"),
            rules,
        },
        skipped,
    })
}
