// ABOUTME: LookupFactTool - serves unit-tagged facts from an in-memory table.
// ABOUTME: Stands in for a research data source keyed by source and metric name.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ToolError;
use crate::tool::{Arguments, Tool, ToolValue};
use crate::unit::Quantity;

/// Facts grouped by data source, then by metric name.
#[derive(Debug, Clone, Default)]
pub struct FactTable {
    sources: HashMap<String, HashMap<String, Quantity>>,
}

impl FactTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a fact. Later entries replace earlier ones with the same name.
    pub fn fact(mut self, source: &str, name: &str, value: Quantity) -> Self {
        self.sources
            .entry(source.to_lowercase())
            .or_default()
            .insert(name.to_lowercase(), value);
        self
    }

    pub fn get(&self, source: &str, name: &str) -> Option<&Quantity> {
        self.sources
            .get(&source.to_lowercase())
            .and_then(|facts| facts.get(&name.to_lowercase()))
    }

    /// Metric names available for a source, sorted.
    pub fn names(&self, source: &str) -> Vec<String> {
        let mut names: Vec<_> = self
            .sources
            .get(&source.to_lowercase())
            .map(|facts| facts.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }
}

/// Tool for looking up a single fact.
pub struct LookupFactTool {
    table: Arc<FactTable>,
}

impl LookupFactTool {
    pub fn new(table: FactTable) -> Self {
        Self {
            table: Arc::new(table),
        }
    }
}

#[async_trait]
impl Tool for LookupFactTool {
    fn name(&self) -> &str {
        "lookup_fact"
    }

    fn description(&self) -> &str {
        "Look up a named metric from a data source. Returns the value with its unit."
    }

    fn schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "source": { "type": "string", "description": "Data source identifier" },
                "name": { "type": "string", "description": "Metric name" }
            },
            "required": ["source", "name"]
        })
    }

    async fn execute(&self, args: &Arguments) -> Result<ToolValue, ToolError> {
        let source = args.text("source")?;
        let name = args.text("name")?;

        match self.table.get(source, name) {
            Some(value) => Ok(ToolValue::Quantity(value.clone())),
            None => Err(ToolError::InvalidParams(format!(
                "No fact '{}' in source '{}'. Available: {}",
                name,
                source,
                self.table.names(source).join(", ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::ArgValue;
    use crate::unit::Unit;

    fn table() -> FactTable {
        FactTable::new()
            .fact("renewable_energy", "market_size", Quantity::new(1200.0, Unit::Billions))
            .fact("renewable_energy", "growth_rate", Quantity::scalar(0.096))
    }

    fn args(source: &str, name: &str) -> Arguments {
        Arguments::new()
            .with("source", ArgValue::Text(source.into()))
            .with("name", ArgValue::Text(name.into()))
    }

    #[tokio::test]
    async fn test_lookup_is_case_insensitive() {
        let tool = LookupFactTool::new(table());
        let result = tool.execute(&args("Renewable_Energy", "MARKET_SIZE")).await.unwrap();
        assert_eq!(
            result,
            ToolValue::Quantity(Quantity::new(1200.0, Unit::Billions))
        );
    }

    #[tokio::test]
    async fn test_lookup_missing_lists_available_names() {
        let tool = LookupFactTool::new(table());
        match tool.execute(&args("renewable_energy", "jobs")).await {
            Err(ToolError::InvalidParams(msg)) => {
                assert!(msg.contains("growth_rate"));
                assert!(msg.contains("market_size"));
            }
            other => panic!("Expected InvalidParams, got {:?}", other),
        }
    }
}
