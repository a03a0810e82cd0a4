// ABOUTME: Store module - the shared deliverable register.
// ABOUTME: Provides DeliverableStore with per-key single-terminal-write semantics.

mod store;

pub use store::DeliverableStore;

#[cfg(test)]
mod store_test;
