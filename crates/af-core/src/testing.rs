//! In-memory doubles for the DOM, clock and store.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use async_trait::async_trait;

use crate::clock::Clock;
use crate::dom::{Document, DomElement, DomEvent, ElementKind};
use crate::error::{DomError, StoreError};
use crate::store::RuleStore;
use crate::types::{Rule, RuleSet};

// =============================================================================
// Clock
// =============================================================================

/// Virtual clock: `sleep` advances time instantly.
#[derive(Clone, Default)]
pub struct FakeClock {
    now: Rc<Cell<Duration>>,
    sleeps: Rc<Cell<usize>>,
}

impl FakeClock {
    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn sleeps(&self) -> usize {
        self.sleeps.get()
    }
}

#[async_trait(?Send)]
impl Clock for FakeClock {
    fn now(&self) -> Duration {
        self.now.get()
    }

    async fn sleep(&self, duration: Duration) {
        self.sleeps.set(self.sleeps.get() + 1);
        self.advance(duration);
    }
}

// =============================================================================
// Elements
// =============================================================================

struct ElementState {
    kind: ElementKind,
    visible: Cell<bool>,
    /// Becomes visible once this clock reaches the given time
    shown_at: RefCell<Option<(FakeClock, Duration)>>,
    visibility_checks: Cell<usize>,
    fail: Cell<bool>,
    value: RefCell<String>,
    text: RefCell<String>,
    value_attribute: RefCell<Option<String>>,
    trace: RefCell<Vec<String>>,
}

/// Element recording every operation performed on it.
#[derive(Clone)]
pub struct FakeElement(Rc<ElementState>);

impl FakeElement {
    pub fn new(kind: ElementKind) -> Self {
        Self(Rc::new(ElementState {
            kind,
            visible: Cell::new(true),
            shown_at: RefCell::new(None),
            visibility_checks: Cell::new(0),
            fail: Cell::new(false),
            value: RefCell::new(String::new()),
            text: RefCell::new(String::new()),
            value_attribute: RefCell::new(None),
            trace: RefCell::new(Vec::new()),
        }))
    }

    pub fn input() -> Self {
        Self::new(ElementKind::FormControl)
    }

    pub fn hidden(self) -> Self {
        self.0.visible.set(false);
        self
    }

    /// Hidden until `clock` reaches `at`.
    pub fn shown_at(self, clock: &FakeClock, at: Duration) -> Self {
        self.0.visible.set(false);
        *self.0.shown_at.borrow_mut() = Some((clock.clone(), at));
        self
    }

    pub fn visibility_checks(&self) -> usize {
        self.0.visibility_checks.get()
    }

    /// Every DOM call on this element throws.
    pub fn failing(self) -> Self {
        self.0.fail.set(true);
        self
    }

    pub fn value(&self) -> String {
        self.0.value.borrow().clone()
    }

    pub fn text(&self) -> String {
        self.0.text.borrow().clone()
    }

    pub fn value_attribute(&self) -> Option<String> {
        self.0.value_attribute.borrow().clone()
    }

    pub fn trace(&self) -> Vec<String> {
        self.0.trace.borrow().clone()
    }

    /// Only the dispatched event names, in order.
    pub fn events(&self) -> Vec<String> {
        self.trace()
            .into_iter()
            .filter_map(|entry| entry.strip_prefix("event:").map(str::to_string))
            .collect()
    }

    fn record(&self, entry: String) -> Result<(), DomError> {
        if self.0.fail.get() {
            return Err(DomError::Operation(format!("{} rejected", entry)));
        }
        self.0.trace.borrow_mut().push(entry);
        Ok(())
    }
}

impl DomElement for FakeElement {
    fn kind(&self) -> ElementKind {
        self.0.kind
    }

    fn is_visible(&self) -> bool {
        self.0.visibility_checks.set(self.0.visibility_checks.get() + 1);
        match &*self.0.shown_at.borrow() {
            Some((clock, at)) if clock.now() >= *at => true,
            _ => self.0.visible.get(),
        }
    }

    fn focus(&self) -> Result<(), DomError> {
        self.record("focus()".to_string())
    }

    fn dispatch(&self, event: DomEvent) -> Result<(), DomError> {
        self.record(format!("event:{}", event.name()))
    }

    fn set_value(&self, value: &str) -> Result<(), DomError> {
        self.record(format!("value={}", value))?;
        *self.0.value.borrow_mut() = value.to_string();
        Ok(())
    }

    fn set_text_content(&self, text: &str) -> Result<(), DomError> {
        self.record(format!("text={}", text))?;
        *self.0.text.borrow_mut() = text.to_string();
        Ok(())
    }

    fn set_value_attribute(&self, value: &str) -> Result<(), DomError> {
        self.record(format!("attr={}", value))?;
        *self.0.value_attribute.borrow_mut() = Some(value.to_string());
        Ok(())
    }
}

// =============================================================================
// Document
// =============================================================================

struct Registered {
    element: FakeElement,
    available_from: Duration,
}

/// Document answering queries from a selector table.
///
/// Elements can be registered to appear only after some virtual time, to
/// simulate a page that is still rendering.
#[derive(Clone)]
pub struct FakeDocument {
    clock: FakeClock,
    url: Rc<RefCell<String>>,
    css: Rc<RefCell<HashMap<String, Vec<Registered>>>>,
    xpath: Rc<RefCell<HashMap<String, Vec<Registered>>>>,
    queries: Rc<Cell<usize>>,
}

impl FakeDocument {
    pub fn new(clock: &FakeClock, url: &str) -> Self {
        Self {
            clock: clock.clone(),
            url: Rc::new(RefCell::new(url.to_string())),
            css: Rc::default(),
            xpath: Rc::default(),
            queries: Rc::default(),
        }
    }

    pub fn set_url(&self, url: &str) {
        *self.url.borrow_mut() = url.to_string();
    }

    pub fn add_css(&self, selector: &str, element: FakeElement) {
        self.add_css_after(selector, element, Duration::ZERO);
    }

    pub fn add_css_after(&self, selector: &str, element: FakeElement, after: Duration) {
        let available_from = self.clock.now() + after;
        self.css
            .borrow_mut()
            .entry(selector.to_string())
            .or_default()
            .push(Registered { element, available_from });
    }

    pub fn add_xpath(&self, expression: &str, element: FakeElement) {
        self.xpath
            .borrow_mut()
            .entry(expression.to_string())
            .or_default()
            .push(Registered {
                element,
                available_from: Duration::ZERO,
            });
    }

    pub fn queries(&self) -> usize {
        self.queries.get()
    }

    fn lookup(
        &self,
        table: &RefCell<HashMap<String, Vec<Registered>>>,
        selector: &str,
    ) -> Result<Vec<FakeElement>, DomError> {
        self.queries.set(self.queries.get() + 1);
        if selector.starts_with("!!") {
            return Err(DomError::InvalidSelector(selector.to_string()));
        }
        let now = self.clock.now();
        Ok(table
            .borrow()
            .get(selector)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|entry| entry.available_from <= now)
                    .map(|entry| entry.element.clone())
                    .collect()
            })
            .unwrap_or_default())
    }
}

impl Document for FakeDocument {
    type Element = FakeElement;

    fn query_css(&self, selector: &str) -> Result<Vec<FakeElement>, DomError> {
        self.lookup(&self.css, selector)
    }

    fn query_xpath(&self, expression: &str) -> Result<Vec<FakeElement>, DomError> {
        self.lookup(&self.xpath, expression)
    }

    fn current_url(&self) -> String {
        self.url.borrow().clone()
    }
}

// =============================================================================
// Store
// =============================================================================

/// Store that counts its reads.
#[derive(Clone, Default)]
pub struct MemoryStore {
    contents: Rc<RefCell<RuleSet>>,
    reads: Rc<Cell<usize>>,
    unavailable: Rc<Cell<bool>>,
}

impl MemoryStore {
    pub fn with_rules(rules: Vec<Rule>) -> Self {
        let store = Self::default();
        store.contents.borrow_mut().rules = rules;
        store
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.contents.borrow_mut().enabled = enabled;
    }

    pub fn set_rules(&self, rules: Vec<Rule>) {
        self.contents.borrow_mut().rules = rules;
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.set(unavailable);
    }

    pub fn reads(&self) -> usize {
        self.reads.get()
    }
}

#[async_trait(?Send)]
impl RuleStore for MemoryStore {
    async fn load(&self) -> Result<RuleSet, StoreError> {
        self.reads.set(self.reads.get() + 1);
        if self.unavailable.get() {
            return Err(StoreError::Unavailable("storage offline".to_string()));
        }
        Ok(self.contents.borrow().clone())
    }
}
