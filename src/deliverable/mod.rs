// ABOUTME: Deliverable module - specs describing what to resolve and records of outcomes.
// ABOUTME: Shared vocabulary for the planner, researcher, store, and report.

mod record;
mod spec;

pub use record::{
    DeliverableRecord, FailureReason, RecordState, SENTINEL, Status, UndeterminedCause,
};
pub use spec::{DataLevel, DeliverableSpec, SpecOverrides};
