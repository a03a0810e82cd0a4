// ABOUTME: Prelude module - convenient imports for common use cases.
// ABOUTME: Use `use dossier::prelude::*;` to get started quickly.

pub use crate::config::{EngineConfig, LlmSettings};
pub use crate::deliverable::{
    DataLevel, DeliverableRecord, DeliverableSpec, FailureReason, RecordState, SENTINEL,
    SpecOverrides, Status, UndeterminedCause,
};
pub use crate::engine::{
    Decision, DecisionContext, DraftDeliverable, DraftPlan, LlmEngine, PlanningEngine,
    ReasoningEngine, Reply, ScriptedEngine,
};
pub use crate::error::{
    ConfigError, DossierError, EngineError, LlmError, StoreError, ToolError,
};
pub use crate::llm::{LlmClient, OpenAIClient};
pub use crate::planner::{Plan, Planner};
pub use crate::report::{Entry, Report, render};
pub use crate::researcher::{LogEntry, Researcher};
pub use crate::store::DeliverableStore;
pub use crate::supervisor::{RunSummary, Supervisor};
pub use crate::tool::{ArgValue, Arguments, Registry, Tool, ToolCall, ToolResult, ToolValue};
pub use crate::tools::{
    ArithmeticTool, CompoundGrowthTool, FactTable, LookupFactTool, NetPresentValueTool,
    ReturnOnInvestmentTool, register_calculators,
};
pub use crate::trace::{LogTrace, MemoryTrace, TraceEvent, TraceSink, Tracer};
pub use crate::unit::{Quantity, Unit};
