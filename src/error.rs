// ABOUTME: Defines all error types for the dossier library using thiserror.
// ABOUTME: Each submodule has its own error enum, unified under DossierError.

use crate::unit::Unit;

/// Top-level error type for the dossier library.
///
/// Only errors that indicate the invariant machinery itself is broken reach
/// this type from a run. Deliverable-level failures are recorded in the store.
#[derive(Debug, thiserror::Error)]
pub enum DossierError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors from the deliverable store.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StoreError {
    #[error("Deliverable key '{0}' is already registered")]
    DuplicateKey(String),

    #[error("Deliverable key '{0}' is not registered")]
    UnknownKey(String),

    #[error("Deliverable '{key}' is already terminal ({state})")]
    AlreadyTerminal { key: String, state: String },

    #[error("Deliverable '{0}' is already running")]
    AlreadyRunning(String),

    #[error("Deliverable '{key}' expects unit '{expected}', got '{actual}'")]
    UnitMismatch {
        key: String,
        expected: Unit,
        actual: Unit,
    },
}

impl StoreError {
    /// Whether this error means the store's consistency guarantees were violated.
    ///
    /// Fatal errors abort the whole run. A unit mismatch is a deliverable-level
    /// failure and is recorded on the offending record instead.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, StoreError::UnitMismatch { .. })
    }
}

/// Errors from the reasoning engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Reasoning engine unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid decision: {0}")]
    InvalidDecision(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),
}

/// Errors from LLM client operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Deserialization error: {0}")]
    Deserialize(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Errors from tool operations.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParams(String),

    #[error("Unit mismatch: expected '{expected}', got '{actual}'")]
    UnitMismatch { expected: Unit, actual: Unit },

    #[error("Value {0} does not come from an earlier tool result")]
    UntracedValue(String),

    #[error("Execution failed: {0}")]
    Execution(#[source] anyhow::Error),
}

impl ToolError {
    /// Whether retrying the same invocation could succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ToolError::Execution(_))
    }
}

/// Errors from loading or validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
