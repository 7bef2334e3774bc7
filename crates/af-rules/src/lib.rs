//! AutoFill Rule File Tooling
//!
//! This crate reads, checks and writes the JSON rule files users import and
//! export from the popup.

pub mod bundle;
pub mod validate;
pub mod export;

pub use bundle::{parse_rule_bundle, BundleError, ImportedRules, RuleBundle, SkippedRecord};
pub use export::{backup_file_name, build_bundle, BUNDLE_VERSION};
pub use validate::{dedupe_rules, validate_rules, DedupeStats, Issue, IssueKind};
