// ABOUTME: Built-in calculation tools for researchers.
// ABOUTME: Unit-checked arithmetic, financial projections, and fact lookup.

mod arithmetic;
mod facts;
mod finance;

pub use arithmetic::ArithmeticTool;
pub use facts::{FactTable, LookupFactTool};
pub use finance::{CompoundGrowthTool, NetPresentValueTool, ReturnOnInvestmentTool};

use crate::tool::Registry;

/// Register every built-in calculation tool. Fact lookup needs a table and is
/// registered separately.
pub async fn register_calculators(registry: &Registry) {
    registry.register(ArithmeticTool).await;
    registry.register(CompoundGrowthTool).await;
    registry.register(NetPresentValueTool).await;
    registry.register(ReturnOnInvestmentTool).await;
}
