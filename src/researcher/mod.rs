// ABOUTME: Researcher module - the task that resolves a single deliverable.
// ABOUTME: Owns its working state; shares only the deliverable store.

mod runner;
mod state;

pub use runner::Researcher;
pub use state::{LogEntry, ResearcherState};


#[cfg(test)]
mod state_test;
