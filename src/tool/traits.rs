// ABOUTME: Defines the Tool trait - the core abstraction for callable capabilities.
// ABOUTME: Tools have a name, description, schema, and async execute method.

use async_trait::async_trait;

use super::{Arguments, ToolValue};
use crate::error::ToolError;

/// A tool that a researcher can invoke.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Returns the unique name of this tool.
    fn name(&self) -> &str;

    /// Returns a human-readable description for the reasoning engine.
    fn description(&self) -> &str;

    /// Returns the JSON Schema for the tool's input parameters.
    fn schema(&self) -> serde_json::Value;

    /// Execute the tool with resolved arguments (no step references remain).
    ///
    /// Implementations must return `ToolError::UnitMismatch` rather than
    /// combining quantities whose unit tags disagree.
    async fn execute(&self, args: &Arguments) -> Result<ToolValue, ToolError>;
}
