//! Core type definitions for AutoFill
//!
//! These types mirror the JSON records kept in extension storage and the
//! result objects handed back to the popup.

use serde::{Deserialize, Serialize};

// =============================================================================
// Selector Kinds
// =============================================================================

/// How a rule's selector string is interpreted.
///
/// Stored as a plain string. Values other than `css`/`xpath` are kept verbatim
/// so that an unknown kind survives a load/save round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SelectorType {
    #[default]
    Css,
    Xpath,
    Unsupported(String),
}

impl SelectorType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Css => "css",
            Self::Xpath => "xpath",
            Self::Unsupported(raw) => raw,
        }
    }

    pub fn is_supported(&self) -> bool {
        !matches!(self, Self::Unsupported(_))
    }
}

impl From<String> for SelectorType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "css" => Self::Css,
            "xpath" => Self::Xpath,
            _ => Self::Unsupported(value),
        }
    }
}

impl From<&str> for SelectorType {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<SelectorType> for String {
    fn from(value: SelectorType) -> Self {
        match value {
            SelectorType::Unsupported(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

// =============================================================================
// Rule
// =============================================================================

/// A persisted fill rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    /// Unique, assigned at creation
    pub id: String,
    pub selector: String,
    #[serde(default)]
    #[cfg_attr(feature = "ts", ts(type = "string"))]
    pub selector_type: SelectorType,
    /// Value to inject (may be empty)
    #[serde(default)]
    pub fill_value: String,
    /// URL patterns; a rule without patterns never matches
    #[serde(default)]
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts", ts(optional))]
    pub created_at: Option<String>,
}

impl Rule {
    pub fn new(
        id: impl Into<String>,
        selector: impl Into<String>,
        selector_type: SelectorType,
        fill_value: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            selector: selector.into(),
            selector_type,
            fill_value: fill_value.into(),
            urls: Vec::new(),
            created_at: None,
        }
    }

    /// Builder-style helper for attaching URL patterns.
    pub fn with_urls<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.urls = urls.into_iter().map(Into::into).collect();
        self
    }
}

/// Enable flag and rule list, read together from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleSet {
    pub enabled: bool,
    pub rules: Vec<Rule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            enabled: true,
            rules: Vec::new(),
        }
    }
}

// =============================================================================
// Execution Results
// =============================================================================

/// Outcome of filling one located element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct ElementOutcome {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts", ts(optional))]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts", ts(optional))]
    pub error: Option<String>,
}

impl ElementOutcome {
    pub fn filled() -> Self {
        Self {
            success: true,
            action: Some("fill".to_string()),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            action: None,
            error: Some(error.into()),
        }
    }
}

/// Result of running one rule against the page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub struct RuleExecution {
    pub rule_id: String,
    /// True when at least one element was located
    pub success: bool,
    pub found: usize,
    pub executed: usize,
    pub failed: usize,
    #[serde(default)]
    pub results: Vec<ElementOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts", ts(optional))]
    pub error: Option<String>,
}

impl RuleExecution {
    /// Result for a rule whose selector resolved to nothing.
    pub fn not_found(rule: &Rule) -> Self {
        Self {
            rule_id: rule.id.clone(),
            success: false,
            found: 0,
            executed: 0,
            failed: 0,
            results: Vec::new(),
            error: Some(format!("not found: {}", rule.selector)),
        }
    }

    /// Aggregate per-element outcomes.
    pub fn from_outcomes(rule: &Rule, results: Vec<ElementOutcome>) -> Self {
        let executed = results.iter().filter(|r| r.success).count();
        Self {
            rule_id: rule.id.clone(),
            success: true,
            found: results.len(),
            executed,
            failed: results.len() - executed,
            results,
            error: None,
        }
    }
}

/// Why a matching pass did (or did not) run any rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(rename_all = "camelCase")]
pub enum RunStatus {
    Disabled,
    NoRules,
    NoMatchingRules,
    Completed,
}

impl RunStatus {
    pub fn message(self) -> Option<&'static str> {
        match self {
            Self::Disabled => Some("disabled"),
            Self::NoRules => Some("no rules"),
            Self::NoMatchingRules => Some("no rules match the current URL"),
            Self::Completed => None,
        }
    }
}

/// Aggregated result of one `run_matching_rules` pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct RunSummary {
    pub status: RunStatus,
    /// Number of matching rules that were run
    pub executed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts", ts(optional))]
    pub message: Option<String>,
    #[serde(default)]
    pub results: Vec<RuleExecution>,
}

impl RunSummary {
    /// A pass that short-circuited before touching the page.
    pub fn skipped(status: RunStatus) -> Self {
        Self {
            status,
            executed: 0,
            message: status.message().map(str::to_string),
            results: Vec::new(),
        }
    }

    pub fn completed(results: Vec<RuleExecution>) -> Self {
        Self {
            status: RunStatus::Completed,
            executed: results.len(),
            message: None,
            results,
        }
    }
}
