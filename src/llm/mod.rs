// ABOUTME: LLM module - client abstraction for chat-completion providers.
// ABOUTME: Backs the LLM reasoning engine; tests use scripted engines instead.

mod client;
mod openai;
mod types;

pub use client::*;
pub use openai::*;
pub use types::*;

#[cfg(test)]
mod types_test;

#[cfg(test)]
mod openai_test;
