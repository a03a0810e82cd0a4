// ABOUTME: The reasoning engine contract - decisions, their context, and planning drafts.
// ABOUTME: Researchers and planners talk to engines only through these traits.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::deliverable::{DataLevel, DeliverableSpec, SpecOverrides};
use crate::error::EngineError;
use crate::llm::ToolDefinition;
use crate::researcher::LogEntry;
use crate::tool::{ArgValue, ToolCall};
use crate::unit::Unit;

/// What a researcher should do next.
#[derive(Debug, Clone, PartialEq)]
pub enum Decision {
    /// Invoke a registered tool.
    Tool(ToolCall),
    /// Hand a sub-deliverable to a nested researcher.
    Delegate(SpecOverrides),
    /// Write the final value and finish. Usually a `Ref` to an earlier step.
    Store { value: ArgValue },
    /// Give up with a reason.
    Abort { reason: String },
    /// Record reasoning without acting.
    Note(String),
    /// Finish with prose instead of a stored value.
    Answer(String),
}

impl Decision {
    /// Short name used in traces.
    pub fn kind(&self) -> &'static str {
        match self {
            Decision::Tool(_) => "tool",
            Decision::Delegate(_) => "delegate",
            Decision::Store { .. } => "store",
            Decision::Abort { .. } => "abort",
            Decision::Note(_) => "note",
            Decision::Answer(_) => "answer",
        }
    }

    /// Store a reference to the value produced at `step`.
    pub fn store_ref(step: usize) -> Self {
        Decision::Store {
            value: ArgValue::Ref(step),
        }
    }
}

/// Everything an engine sees when asked for one decision.
#[derive(Debug, Clone, Copy)]
pub struct DecisionContext<'a> {
    pub spec: &'a DeliverableSpec,
    pub log: &'a [LogEntry],
    pub tools: &'a [ToolDefinition],
    /// Zero-based index of the step being decided.
    pub step: usize,
    pub max_steps: usize,
    pub max_depth: usize,
}

impl DecisionContext<'_> {
    /// Whether a delegation from this task would still be attempted.
    pub fn can_delegate(&self) -> bool {
        self.spec.depth() + 1 < self.max_depth
    }
}

/// Chooses the next step of a researcher task.
#[async_trait]
pub trait ReasoningEngine: Send + Sync {
    /// `Unavailable` and `Llm` errors are retried by the caller;
    /// `InvalidDecision` is logged against the step.
    async fn decide(&self, ctx: &DecisionContext<'_>) -> Result<Decision, EngineError>;
}

/// A deliverable as first proposed, before keys are cleaned up.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftDeliverable {
    pub key: String,
    pub description: String,
    pub data_level: DataLevel,
    pub data_source: String,
    pub calculation_guidance: String,
    pub expected_unit: Option<Unit>,
}

impl DraftDeliverable {
    pub fn new(key: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            description: description.into(),
            ..Default::default()
        }
    }

    pub fn data_source(mut self, source: impl Into<String>) -> Self {
        self.data_source = source.into();
        self
    }

    pub fn expected_unit(mut self, unit: impl Into<Unit>) -> Self {
        self.expected_unit = Some(unit.into());
        self
    }
}

/// An engine's proposed research plan.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DraftPlan {
    pub outline: String,
    pub deliverables: Vec<DraftDeliverable>,
}

/// Drafts a research plan from a query.
#[async_trait]
pub trait PlanningEngine: Send + Sync {
    async fn draft_plan(&self, query: &str) -> Result<DraftPlan, EngineError>;
}
