//! Execution orchestrator
//!
//! One `Engine` exists per page context. It owns the rule cache and borrows
//! the page, the store and the clock through their traits, so the whole flow
//! runs the same against a live document or an in-memory one.

use std::rc::Rc;

use crate::cache::RuleCache;
use crate::clock::Clock;
use crate::config::EngineConfig;
use crate::dom::Document;
use crate::error::{EngineError, StoreError};
use crate::injector::inject;
use crate::locator::{locate, WaitOptions};
use crate::message::{Command, Reply, ReplyResult};
use crate::store::RuleStore;
use crate::types::{ElementOutcome, Rule, RuleExecution, RuleSet, RunStatus, RunSummary};
use crate::url::matches_rule;

pub struct Engine<D, S, C> {
    document: D,
    store: S,
    clock: C,
    config: EngineConfig,
    cache: RuleCache,
}

impl<D, S, C> Engine<D, S, C>
where
    D: Document,
    S: RuleStore,
    C: Clock,
{
    pub fn new(document: D, store: S, clock: C, config: EngineConfig) -> Self {
        let cache = RuleCache::new(config.cache_ttl());
        Self {
            document,
            store,
            clock,
            config,
            cache,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    /// Enable flag and rules, from cache when fresh.
    pub async fn rules(&self) -> Result<Rc<RuleSet>, StoreError> {
        self.cache.get(&self.store, &self.clock).await
    }

    /// Forget cached rules after the store changed.
    pub fn invalidate_cache(&self) {
        self.cache.invalidate();
    }

    /// Locate the rule's targets and fill every one of them.
    ///
    /// A failure on one element is recorded and the remaining elements are
    /// still filled.
    pub async fn run_single_rule(&self, rule: &Rule) -> RuleExecution {
        let wait = WaitOptions {
            timeout: self.config.locate_timeout(),
            interval: self.config.poll_interval(),
        };
        let targets = locate(
            &self.document,
            &self.clock,
            &rule.selector,
            &rule.selector_type,
            wait,
        )
        .await;

        if targets.is_empty() {
            return RuleExecution::not_found(rule);
        }

        let mut outcomes = Vec::with_capacity(targets.len());
        for target in &targets {
            let outcome = match inject(
                target,
                &rule.fill_value,
                &self.clock,
                self.config.visibility_retry(),
            )
            .await
            {
                Ok(()) => ElementOutcome::filled(),
                Err(e) => ElementOutcome::failed(e.to_string()),
            };
            outcomes.push(outcome);
        }

        RuleExecution::from_outcomes(rule, outcomes)
    }

    /// Run every rule whose patterns match the current page, one after the
    /// other, in stored order.
    pub async fn run_matching_rules(&self) -> Result<RunSummary, EngineError> {
        let rule_set = self.rules().await?;

        if !rule_set.enabled {
            return Ok(RunSummary::skipped(RunStatus::Disabled));
        }
        if rule_set.rules.is_empty() {
            return Ok(RunSummary::skipped(RunStatus::NoRules));
        }

        let url = self.document.current_url();
        let matching: Vec<&Rule> = rule_set
            .rules
            .iter()
            .filter(|rule| matches_rule(rule, &url))
            .collect();

        if matching.is_empty() {
            return Ok(RunSummary::skipped(RunStatus::NoMatchingRules));
        }

        log::debug!("{} rule(s) match {}", matching.len(), url);

        let mut results = Vec::with_capacity(matching.len());
        for rule in matching {
            results.push(self.run_single_rule(rule).await);
        }
        Ok(RunSummary::completed(results))
    }

    /// Serve one inbound command.
    pub async fn handle_command(&self, command: Command) -> Reply {
        match command {
            Command::ExecuteRule { rule } => {
                let execution = self.run_single_rule(&rule).await;
                match execution.error.clone() {
                    Some(error) if !execution.success => Reply::err(error),
                    _ => Reply::ok(ReplyResult::Rule(execution)),
                }
            }
            Command::ExecuteAllAutoRules => match self.run_matching_rules().await {
                Ok(summary) => Reply::ok(ReplyResult::Run(summary)),
                Err(e) => Reply::err(e.to_string()),
            },
        }
    }
}
