//! Error types shared across the engine.

/// A DOM operation failed (the browser threw).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("Invalid selector: {0}")]
    InvalidSelector(String),
    #[error("DOM operation failed: {0}")]
    Operation(String),
}

/// The persistent rule store could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
    #[error("Malformed store data: {0}")]
    Malformed(String),
}

/// Failure of the orchestration scaffolding itself.
///
/// Per-element and per-rule failures never surface here; they are captured
/// in the execution result instead.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("Failed to read rules: {0}")]
    StoreRead(#[from] StoreError),
}
