// ABOUTME: Root module for dossier - bounded recursive research over named numeric deliverables.
// ABOUTME: Re-exports the public types from submodules.

pub mod config;
pub mod deliverable;
pub mod engine;
pub mod error;
pub mod llm;
pub mod planner;
pub mod prelude;
pub mod report;
pub mod researcher;
pub mod store;
pub mod supervisor;
pub mod tool;
pub mod tools;
pub mod trace;
pub mod unit;

pub use error::DossierError;
