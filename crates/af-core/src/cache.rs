//! Time-boxed memo of the store's flag and rule list
//!
//! Rapid in-page navigation would otherwise hit the store on every pass. The
//! entry holds both values together and is replaced as a whole.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::Duration;

use crate::clock::Clock;
use crate::error::StoreError;
use crate::store::RuleStore;
use crate::types::RuleSet;

struct CacheEntry {
    rules: Rc<RuleSet>,
    fetched_at: Duration,
}

pub struct RuleCache {
    ttl: Duration,
    entry: RefCell<Option<CacheEntry>>,
    /// Bumped on every invalidation, so a read that was in flight when the
    /// rules changed does not repopulate the cache with stale data
    epoch: Cell<u64>,
}

impl RuleCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entry: RefCell::new(None),
            epoch: Cell::new(0),
        }
    }

    /// The cached rule set, if still fresh at `now`.
    pub fn peek(&self, now: Duration) -> Option<Rc<RuleSet>> {
        self.entry
            .borrow()
            .as_ref()
            .filter(|entry| now.saturating_sub(entry.fetched_at) < self.ttl)
            .map(|entry| Rc::clone(&entry.rules))
    }

    /// Serve from memory within the TTL, otherwise do one batched store read.
    pub async fn get<S, C>(&self, store: &S, clock: &C) -> Result<Rc<RuleSet>, StoreError>
    where
        S: RuleStore + ?Sized,
        C: Clock + ?Sized,
    {
        if let Some(rules) = self.peek(clock.now()) {
            return Ok(rules);
        }

        let epoch = self.epoch.get();
        let rules = Rc::new(store.load().await?);

        if self.epoch.get() == epoch {
            *self.entry.borrow_mut() = Some(CacheEntry {
                rules: Rc::clone(&rules),
                fetched_at: clock.now(),
            });
        }
        Ok(rules)
    }

    /// Drop the entry; the next `get` reads the store regardless of age.
    pub fn invalidate(&self) {
        self.epoch.set(self.epoch.get() + 1);
        self.entry.borrow_mut().take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeClock, MemoryStore};
    use crate::types::{Rule, SelectorType};

    const TTL: Duration = Duration::from_millis(5000);

    #[tokio::test]
    async fn test_reads_once_within_ttl() {
        let clock = FakeClock::default();
        let store = MemoryStore::default();
        let cache = RuleCache::new(TTL);

        cache.get(&store, &clock).await.unwrap();
        clock.advance(Duration::from_millis(4999));
        cache.get(&store, &clock).await.unwrap();
        assert_eq!(store.reads(), 1);
    }

    #[tokio::test]
    async fn test_rereads_after_ttl() {
        let clock = FakeClock::default();
        let store = MemoryStore::default();
        let cache = RuleCache::new(TTL);

        cache.get(&store, &clock).await.unwrap();
        clock.advance(TTL);
        cache.get(&store, &clock).await.unwrap();
        assert_eq!(store.reads(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_forces_fresh_read() {
        let clock = FakeClock::default();
        let store = MemoryStore::default();
        let cache = RuleCache::new(TTL);

        assert!(cache.get(&store, &clock).await.unwrap().rules.is_empty());
        store.set_rules(vec![Rule::new("r", "#a", SelectorType::Css, "v")]);
        cache.invalidate();

        let rules = cache.get(&store, &clock).await.unwrap();
        assert_eq!(rules.rules.len(), 1);
        assert_eq!(store.reads(), 2);
    }

    #[tokio::test]
    async fn test_failed_read_not_cached() {
        let clock = FakeClock::default();
        let store = MemoryStore::default();
        let cache = RuleCache::new(TTL);

        store.set_unavailable(true);
        assert!(cache.get(&store, &clock).await.is_err());
        store.set_unavailable(false);
        assert!(cache.get(&store, &clock).await.is_ok());
        assert_eq!(store.reads(), 2);
        assert!(cache.peek(clock.now()).is_some());
    }
}
