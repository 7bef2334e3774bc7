//! Persistent rule store interface and payload decoding

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;

use crate::config::{ENABLED_KEY, RULES_KEY};
use crate::error::StoreError;
use crate::types::{Rule, RuleSet};

/// Read side of the extension's key-value storage.
///
/// Implementations perform one batched read of both keys.
#[async_trait(?Send)]
pub trait RuleStore {
    async fn load(&self) -> Result<RuleSet, StoreError>;
}

/// Both storage keys exactly as they come back from a `get`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoredValues {
    #[serde(rename = "autoFillEnabled", default)]
    pub enabled: Option<Value>,
    #[serde(default)]
    pub rules: Option<Value>,
}

impl StoredValues {
    /// Decode into a rule set.
    ///
    /// The flag is on unless it is literally `false`. Rule records that fail to
    /// decode are skipped; a `rules` value that is not a list is an error.
    pub fn into_rule_set(self) -> Result<RuleSet, StoreError> {
        let enabled = !matches!(self.enabled, Some(Value::Bool(false)));

        let records = match self.rules {
            None | Some(Value::Null) => Vec::new(),
            Some(Value::Array(records)) => records,
            Some(other) => {
                return Err(StoreError::Malformed(format!(
                    "'{}' is not a list: {}",
                    RULES_KEY, other
                )))
            }
        };

        let mut rules = Vec::with_capacity(records.len());
        for (index, record) in records.into_iter().enumerate() {
            match serde_json::from_value::<Rule>(record) {
                Ok(rule) => rules.push(rule),
                Err(e) => log::warn!("Skipping stored rule #{}: {}", index, e),
            }
        }

        Ok(RuleSet { enabled, rules })
    }
}

/// Decode a whole storage object (`{autoFillEnabled, rules}`).
pub fn decode_rule_set(value: Value) -> Result<RuleSet, StoreError> {
    let values: StoredValues = match value {
        Value::Null => StoredValues::default(),
        other => serde_json::from_value(other)
            .map_err(|e| StoreError::Malformed(e.to_string()))?,
    };
    values.into_rule_set()
}

/// Keys requested in the batched read.
pub fn storage_keys() -> [&'static str; 2] {
    [ENABLED_KEY, RULES_KEY]
}
