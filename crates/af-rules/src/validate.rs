use std::collections::HashSet;
use std::fmt;

use af_core::url::is_valid_pattern;
use af_core::Rule;

/// Problems a rule can have. None of them stop an import; they explain why a
/// rule will never fire or may fire unexpectedly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    DuplicateId,
    EmptySelector,
    UnsupportedSelectorType(String),
    NoUrls,
    InvalidUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub index: usize,
    pub rule_id: String,
    pub kind: IssueKind,
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule #{} ({}): ", self.index, self.rule_id)?;
        match &self.kind {
            IssueKind::DuplicateId => write!(f, "duplicate id"),
            IssueKind::EmptySelector => write!(f, "empty selector"),
            IssueKind::UnsupportedSelectorType(kind) => {
                write!(f, "unsupported selector type '{}'", kind)
            }
            IssueKind::NoUrls => write!(f, "no URL patterns, rule never matches"),
            IssueKind::InvalidUrl(url) => write!(f, "invalid URL pattern '{}'", url),
        }
    }
}

pub fn validate_rules(rules: &[Rule]) -> Vec<Issue> {
    let mut issues = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    for (index, rule) in rules.iter().enumerate() {
        let mut push = |kind| {
            issues.push(Issue {
                index,
                rule_id: rule.id.clone(),
                kind,
            })
        };

        if !seen.insert(rule.id.as_str()) {
            push(IssueKind::DuplicateId);
        }
        if rule.selector.trim().is_empty() {
            push(IssueKind::EmptySelector);
        }
        if !rule.selector_type.is_supported() {
            push(IssueKind::UnsupportedSelectorType(
                rule.selector_type.as_str().to_string(),
            ));
        }
        if rule.urls.is_empty() {
            push(IssueKind::NoUrls);
        }
        for url in &rule.urls {
            if !is_valid_pattern(url) {
                push(IssueKind::InvalidUrl(url.clone()));
            }
        }
    }

    issues
}

pub struct DedupeStats {
    pub before: usize,
    pub after: usize,
    pub deduped: usize,
}

/// Keep the first record for every id, preserving order.
pub fn dedupe_rules(rules: &mut Vec<Rule>) -> DedupeStats {
    let before = rules.len();
    let mut seen: HashSet<String> = HashSet::new();
    rules.retain(|rule| seen.insert(rule.id.clone()));

    let after = rules.len();
    if after < before {
        log::debug!("Dropped {} rule(s) with duplicate ids", before - after);
    }

    DedupeStats {
        before,
        after,
        deduped: before - after,
    }
}
