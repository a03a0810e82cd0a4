// ABOUTME: Tool module - defines the tool invocation boundary.
// ABOUTME: Tool trait, typed calls and results, and the registry that invokes them.

mod call;
mod registry;
mod traits;

pub use call::*;
pub use registry::*;
pub use traits::*;
