// ABOUTME: DeliverableRecord - the store's entry for one deliverable and its state machine.
// ABOUTME: Terminal states (Resolved, Failed, Undetermined) are never left once entered.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::unit::{Quantity, Unit};

/// Literal placeholder for a deliverable without a value.
pub const SENTINEL: &str = "To be determined";

/// Why a deliverable was recorded as failed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum FailureReason {
    /// Delegated at or beyond the depth ceiling; never attempted.
    DepthExceeded { depth: usize, max_depth: usize },
    /// A calculation chain or the stored value carried the wrong scale tag.
    UnitMismatch { expected: Unit, actual: Unit },
    /// The researcher gave up explicitly.
    Aborted { message: String },
}

impl FailureReason {
    /// Short machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            FailureReason::DepthExceeded { .. } => "depth_exceeded",
            FailureReason::UnitMismatch { .. } => "unit_mismatch",
            FailureReason::Aborted { .. } => "aborted",
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureReason::DepthExceeded { depth, max_depth } => {
                write!(f, "depth_exceeded (depth {} >= max {})", depth, max_depth)
            }
            FailureReason::UnitMismatch { expected, actual } => {
                write!(f, "unit_mismatch (expected {}, got {})", expected, actual)
            }
            FailureReason::Aborted { message } => write!(f, "aborted: {}", message),
        }
    }
}

/// Why an attempted deliverable ended without a value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "cause", rename_all = "snake_case")]
pub enum UndeterminedCause {
    StepBudgetExhausted { steps: usize },
    Timeout { after_ms: u64 },
    EngineUnavailable { attempts: usize },
    /// The engine gave a final answer without storing a value.
    NoValueStored,
}

impl fmt::Display for UndeterminedCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UndeterminedCause::StepBudgetExhausted { steps } => {
                write!(f, "step budget exhausted after {} steps", steps)
            }
            UndeterminedCause::Timeout { after_ms } => write!(f, "timed out after {}ms", after_ms),
            UndeterminedCause::EngineUnavailable { attempts } => {
                write!(f, "reasoning engine unavailable after {} attempts", attempts)
            }
            UndeterminedCause::NoValueStored => write!(f, "finished without storing a value"),
        }
    }
}

/// State of a deliverable record.
///
/// `Unresolved -> Running -> {Resolved | Failed | Undetermined}`. A record may
/// also jump from `Unresolved` straight to a terminal state (depth failures
/// are never started).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum RecordState {
    /// Registered, never attempted.
    Unresolved,
    Running,
    Resolved { value: Quantity },
    Failed { reason: FailureReason },
    /// Attempted but ran out of budget; holds the sentinel.
    Undetermined { cause: UndeterminedCause },
}

impl RecordState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RecordState::Resolved { .. } | RecordState::Failed { .. } | RecordState::Undetermined { .. }
        )
    }

    /// Collapse to the three-way status used by reports.
    pub fn status(&self) -> Status {
        match self {
            RecordState::Resolved { .. } => Status::Resolved,
            RecordState::Failed { .. } => Status::Failed,
            RecordState::Unresolved | RecordState::Running | RecordState::Undetermined { .. } => {
                Status::Unresolved
            }
        }
    }

    fn label(&self) -> &'static str {
        match self {
            RecordState::Unresolved => "unresolved",
            RecordState::Running => "running",
            RecordState::Resolved { .. } => "resolved",
            RecordState::Failed { .. } => "failed",
            RecordState::Undetermined { .. } => "undetermined",
        }
    }
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Coarse outcome of a deliverable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    Resolved,
    Unresolved,
    Failed,
}

/// One entry in the deliverable store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliverableRecord {
    pub key: String,
    pub parent: Option<String>,
    pub root: String,
    pub depth: usize,
    pub expected_unit: Option<Unit>,
    pub state: RecordState,
}

impl DeliverableRecord {
    /// A fresh top-level record with no lineage.
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            root: key.clone(),
            key,
            parent: None,
            depth: 0,
            expected_unit: None,
            state: RecordState::Unresolved,
        }
    }

    pub fn status(&self) -> Status {
        self.state.status()
    }

    pub fn value(&self) -> Option<&Quantity> {
        match &self.state {
            RecordState::Resolved { value } => Some(value),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&FailureReason> {
        match &self.state {
            RecordState::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    /// Whether a researcher ever picked this record up.
    pub fn was_attempted(&self) -> bool {
        !matches!(self.state, RecordState::Unresolved)
    }
}
