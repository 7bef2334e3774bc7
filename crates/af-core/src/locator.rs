//! Element discovery with bounded polling
//!
//! Target pages may still be rendering when a rule runs, so a selector that
//! resolves to nothing is retried at a short interval until a deadline.
//! Running out of time is not an error: the result is simply empty.

use std::time::Duration;

use crate::clock::Clock;
use crate::dom::{Document, DomElement, ElementKind};
use crate::error::DomError;
use crate::types::SelectorType;

/// A located element paired with the fill strategy chosen for it.
#[derive(Debug, Clone)]
pub struct Target<E> {
    pub element: E,
    pub kind: ElementKind,
}

impl<E: DomElement> Target<E> {
    pub fn new(element: E) -> Self {
        let kind = element.kind();
        Self { element, kind }
    }
}

/// Deadline and poll interval for [`locate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitOptions {
    pub timeout: Duration,
    pub interval: Duration,
}

enum Lookup<E> {
    Found(Vec<E>),
    Empty,
    /// Retrying cannot help (bad selector syntax, unknown selector kind)
    Unresolvable,
}

fn lookup<D: Document>(doc: &D, selector: &str, selector_type: &SelectorType) -> Lookup<D::Element> {
    let result = match selector_type {
        SelectorType::Css => doc.query_css(selector),
        SelectorType::Xpath => doc.query_xpath(selector),
        SelectorType::Unsupported(kind) => {
            log::warn!("Unsupported selector type '{}' for '{}'", kind, selector);
            return Lookup::Unresolvable;
        }
    };

    match result {
        Ok(elements) if elements.is_empty() => Lookup::Empty,
        Ok(elements) => Lookup::Found(elements),
        Err(e @ DomError::InvalidSelector(_)) => {
            log::warn!("Selector '{}' cannot be evaluated: {}", selector, e);
            Lookup::Unresolvable
        }
        Err(e) => {
            log::warn!("Query for '{}' failed: {}", selector, e);
            Lookup::Empty
        }
    }
}

/// Resolve a selector once, without waiting.
pub fn find_now<D: Document>(
    doc: &D,
    selector: &str,
    selector_type: &SelectorType,
) -> Vec<Target<D::Element>> {
    match lookup(doc, selector, selector_type) {
        Lookup::Found(elements) => elements.into_iter().map(Target::new).collect(),
        Lookup::Empty | Lookup::Unresolvable => Vec::new(),
    }
}

/// Resolve a selector, polling until something is found or `wait.timeout`
/// has elapsed.
///
/// An unsupported selector kind or a selector the document rejects returns
/// an empty list at once, without waiting for the deadline.
pub async fn locate<D, C>(
    doc: &D,
    clock: &C,
    selector: &str,
    selector_type: &SelectorType,
    wait: WaitOptions,
) -> Vec<Target<D::Element>>
where
    D: Document,
    C: Clock + ?Sized,
{
    let start = clock.now();

    loop {
        match lookup(doc, selector, selector_type) {
            Lookup::Found(elements) => return elements.into_iter().map(Target::new).collect(),
            Lookup::Unresolvable => return Vec::new(),
            Lookup::Empty => {}
        }

        if clock.now().saturating_sub(start) >= wait.timeout {
            return Vec::new();
        }
        clock.sleep(wait.interval).await;
    }
}
