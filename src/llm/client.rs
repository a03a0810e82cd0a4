// ABOUTME: Defines the LlmClient trait - the seam between reasoning engines
// ABOUTME: and whichever chat-completion provider sits behind them.

use async_trait::async_trait;

use super::{Request, Response};
use crate::error::LlmError;

/// Trait for LLM client implementations.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Create a message (non-streaming).
    async fn create_message(&self, req: &Request) -> Result<Response, LlmError>;
}
