use af_core::Rule;

use crate::bundle::RuleBundle;

pub const BUNDLE_VERSION: &str = "1.0";

/// Wrap rules into an export bundle stamped with `exported_at` (ISO-8601).
pub fn build_bundle(rules: &[Rule], exported_at: &str) -> RuleBundle {
    RuleBundle {
        version: Some(BUNDLE_VERSION.to_string()),
        exported_at: Some(exported_at.to_string()),
        rules: rules.to_vec(),
    }
}

/// Download name for a backup, using the timestamp up to the seconds.
pub fn backup_file_name(exported_at: &str) -> String {
    let stamp: String = exported_at.chars().take(19).collect();
    format!("auto-fill-rules-backup-{}.json", stamp)
}
