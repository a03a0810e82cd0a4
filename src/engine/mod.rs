// ABOUTME: Engine module - the reasoning engine contract and its implementations.
// ABOUTME: Scripted for deterministic runs, LLM-backed for real ones.

mod decision;
mod llm;
mod scripted;

pub use decision::*;
pub use llm::*;
pub use scripted::*;
