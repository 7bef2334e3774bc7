//! AutoFill Core Library
//!
//! This crate provides the rule matching and execution engine for the AutoFill
//! extension: given a page, find the rules whose URL patterns match it, locate
//! each rule's target elements and inject the configured value.
//!
//! # Architecture
//!
//! Nothing here touches a browser directly. The page, the persistent store and
//! the timer are reached through the [`Document`], [`RuleStore`] and [`Clock`]
//! traits; the wasm bindings implement them on `web-sys`, the tests on
//! in-memory doubles. All work runs on one single-threaded event loop, so the
//! async traits are `?Send` and shared state uses `Cell`/`RefCell`.
//!
//! # Modules
//!
//! - `url`: URL normalization and pattern matching
//! - `locator`: selector resolution with bounded polling
//! - `injector`: value injection with the event sequence frameworks expect
//! - `cache`: TTL memo of the store's flag and rule list
//! - `engine`: per-page orchestrator
//! - `watcher`: debounced/throttled in-page navigation detection
//! - `message`: inbound commands and replies
//! - `types`: shared type definitions

pub mod cache;
pub mod clock;
pub mod config;
pub mod dom;
pub mod engine;
pub mod error;
pub mod injector;
pub mod locator;
pub mod message;
pub mod store;
pub mod types;
pub mod url;
pub mod watcher;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use clock::Clock;
pub use config::EngineConfig;
pub use dom::{Document, DomElement, DomEvent, ElementKind};
pub use engine::Engine;
pub use error::{DomError, EngineError, StoreError};
pub use message::{decode_message, Command, Inbound, Reply, ReplyResult};
pub use store::RuleStore;
pub use types::{ElementOutcome, Rule, RuleExecution, RuleSet, RunStatus, RunSummary, SelectorType};
pub use crate::url::{matches, matches_rule, normalize};
pub use watcher::{NavigationWatcher, Trigger};
