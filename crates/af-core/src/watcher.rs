//! In-page navigation detection
//!
//! Client-side routers change `location.href` without a page load. The host
//! observes the document root's child list and reports every mutation here.
//! A URL change opens (or restarts) a debounce window; the pass only runs once
//! the window closes, and never while another pass is still in flight.
//!
//! The watcher does not own timers. [`NavigationWatcher::on_mutation`] tells
//! the host to (re)arm one, tagged with a generation number; the host cancels
//! the previous timer and reports back through [`NavigationWatcher::begin_run`]
//! when the new one fires. Stale generations are ignored, so a timer that
//! could not be cancelled in time is harmless.

use std::cell::RefCell;
use std::time::Duration;

use crate::clock::Clock;
use crate::dom::Document;
use crate::engine::Engine;
use crate::error::EngineError;
use crate::store::RuleStore;
use crate::types::RunSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchState {
    Idle,
    /// Debounce window open for this generation
    Pending { generation: u64 },
}

/// What the host should do after a mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// URL unchanged, leave any armed timer alone
    Unchanged,
    /// Cancel the armed timer (if any) and arm a new one
    Arm { generation: u64, delay: Duration },
}

#[derive(Debug)]
pub struct NavigationWatcher {
    last_url: String,
    debounce: Duration,
    state: WatchState,
    generation: u64,
    in_flight: bool,
}

impl NavigationWatcher {
    pub fn new(initial_url: impl Into<String>, debounce: Duration) -> Self {
        Self {
            last_url: initial_url.into(),
            debounce,
            state: WatchState::Idle,
            generation: 0,
            in_flight: false,
        }
    }

    pub fn state(&self) -> WatchState {
        self.state
    }

    pub fn last_url(&self) -> &str {
        &self.last_url
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// A child-list mutation was observed while the page was at `url`.
    pub fn on_mutation(&mut self, url: &str) -> Trigger {
        if url == self.last_url {
            return Trigger::Unchanged;
        }

        self.last_url = url.to_string();
        self.generation += 1;
        self.state = WatchState::Pending {
            generation: self.generation,
        };
        Trigger::Arm {
            generation: self.generation,
            delay: self.debounce,
        }
    }

    /// The timer armed for `generation` fired. Returns true when the caller
    /// should start a pass; it must call [`finish_run`](Self::finish_run)
    /// once the pass completes, successfully or not.
    pub fn begin_run(&mut self, generation: u64) -> bool {
        if self.state != (WatchState::Pending { generation }) {
            return false;
        }
        self.state = WatchState::Idle;

        if self.in_flight {
            log::debug!("Navigation pass skipped, previous pass still running");
            return false;
        }
        self.in_flight = true;
        true
    }

    pub fn finish_run(&mut self) {
        self.in_flight = false;
    }
}

/// Timer callback body: run one pass for `generation` if it is still current
/// and nothing else is running. `None` when the pass was not started.
pub async fn run_settled<D, S, C>(
    watcher: &RefCell<NavigationWatcher>,
    engine: &Engine<D, S, C>,
    generation: u64,
) -> Option<Result<RunSummary, EngineError>>
where
    D: Document,
    S: RuleStore,
    C: Clock,
{
    if !watcher.borrow_mut().begin_run(generation) {
        return None;
    }
    let result = engine.run_matching_rules().await;
    watcher.borrow_mut().finish_run();
    Some(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::testing::{FakeClock, FakeDocument, FakeElement, MemoryStore};
    use crate::types::{Rule, SelectorType};

    const DEBOUNCE: Duration = Duration::from_millis(500);

    fn arm_generation(trigger: Trigger) -> u64 {
        match trigger {
            Trigger::Arm { generation, delay } => {
                assert_eq!(delay, DEBOUNCE);
                generation
            }
            Trigger::Unchanged => panic!("expected a timer to be armed"),
        }
    }

    #[test]
    fn test_same_url_ignored() {
        let mut watcher = NavigationWatcher::new("https://ex.com/", DEBOUNCE);
        assert_eq!(watcher.on_mutation("https://ex.com/"), Trigger::Unchanged);
        assert_eq!(watcher.state(), WatchState::Idle);
    }

    #[test]
    fn test_burst_collapses_to_last_generation() {
        let mut watcher = NavigationWatcher::new("https://ex.com/", DEBOUNCE);
        let mut generations = Vec::new();
        for step in 1..=5 {
            generations.push(arm_generation(
                watcher.on_mutation(&format!("https://ex.com/step{}", step)),
            ));
            // Mutations without a URL change do not touch the window
            assert_eq!(watcher.on_mutation(&format!("https://ex.com/step{}", step)), Trigger::Unchanged);
        }

        let last = *generations.last().unwrap();
        let started: Vec<_> = generations.iter().filter(|&&g| watcher.begin_run(g)).collect();
        assert_eq!(started, [&last]);
        assert_eq!(watcher.last_url(), "https://ex.com/step5");
        assert!(watcher.is_in_flight());
    }

    #[test]
    fn test_fired_timer_not_rerun() {
        let mut watcher = NavigationWatcher::new("https://ex.com/", DEBOUNCE);
        let generation = arm_generation(watcher.on_mutation("https://ex.com/a"));
        assert!(watcher.begin_run(generation));
        watcher.finish_run();
        assert!(!watcher.begin_run(generation));
    }

    #[test]
    fn test_throttled_while_in_flight() {
        let mut watcher = NavigationWatcher::new("https://ex.com/", DEBOUNCE);
        let first = arm_generation(watcher.on_mutation("https://ex.com/a"));
        assert!(watcher.begin_run(first));

        let second = arm_generation(watcher.on_mutation("https://ex.com/b"));
        assert!(!watcher.begin_run(second));
        assert_eq!(watcher.state(), WatchState::Idle);

        watcher.finish_run();
        let third = arm_generation(watcher.on_mutation("https://ex.com/c"));
        assert!(watcher.begin_run(third));
    }

    #[tokio::test]
    async fn test_settled_pass_uses_final_url() {
        let clock = FakeClock::default();
        let doc = FakeDocument::new(&clock, "https://ex.com/");
        let rule = Rule::new("checkout", "#card", SelectorType::Css, "4242")
            .with_urls(["https://ex.com/checkout"]);
        let store = MemoryStore::with_rules(vec![rule]);
        let input = FakeElement::input();
        doc.add_css("#card", input.clone());
        let engine = Engine::new(doc.clone(), store.clone(), clock, EngineConfig::default());
        let watcher = RefCell::new(NavigationWatcher::new(doc.current_url(), DEBOUNCE));

        let mut armed = Vec::new();
        for url in ["https://ex.com/cart", "https://ex.com/shipping", "https://ex.com/checkout"] {
            doc.set_url(url);
            armed.push(arm_generation(watcher.borrow_mut().on_mutation(url)));
        }

        let mut passes = Vec::new();
        for generation in armed {
            if let Some(result) = run_settled(&watcher, &engine, generation).await {
                passes.push(result.unwrap());
            }
        }

        assert_eq!(passes.len(), 1);
        assert_eq!(passes[0].executed, 1);
        assert_eq!(input.value(), "4242");
        assert_eq!(store.reads(), 1);
        assert!(!watcher.borrow().is_in_flight());
    }

    #[tokio::test]
    async fn test_in_flight_cleared_after_failure() {
        let clock = FakeClock::default();
        let doc = FakeDocument::new(&clock, "https://ex.com/");
        let store = MemoryStore::default();
        store.set_unavailable(true);
        let engine = Engine::new(doc, store, clock, EngineConfig::default());
        let watcher = RefCell::new(NavigationWatcher::new("https://ex.com/", DEBOUNCE));

        let generation = arm_generation(watcher.borrow_mut().on_mutation("https://ex.com/next"));
        let result = run_settled(&watcher, &engine, generation).await;
        assert!(matches!(result, Some(Err(EngineError::StoreRead(_)))));
        assert!(!watcher.borrow().is_in_flight());
    }
}
