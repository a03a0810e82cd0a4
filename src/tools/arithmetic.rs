// ABOUTME: ArithmeticTool - unit-checked add, subtract, multiply, divide, and sum.
// ABOUTME: Refuses to combine amounts whose scale tags differ.

use async_trait::async_trait;

use crate::error::ToolError;
use crate::tool::{Arguments, Tool, ToolValue};
use crate::unit::{Quantity, Unit, common_unit};

/// Basic arithmetic over tagged quantities.
///
/// - `add`/`subtract`: both operands must share a unit.
/// - `multiply`: one operand must be `scalar`; the result takes the other's unit.
/// - `divide`: equal units give a `scalar`; dividing by a `scalar` keeps the unit.
/// - `sum`: every entry of `values` must share a unit.
pub struct ArithmeticTool;

#[async_trait]
impl Tool for ArithmeticTool {
    fn name(&self) -> &str {
        "arithmetic"
    }

    fn description(&self) -> &str {
        "Add, subtract, multiply or divide two unit-tagged quantities, or sum a list. \
         Operands must carry compatible units; scales are never converted."
    }

    fn schema(&self) -> serde_json::Value {
        let quantity = serde_json::json!({
            "type": "object",
            "properties": {
                "value": { "type": "number" },
                "unit": { "type": "string" }
            }
        });
        serde_json::json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": ["add", "subtract", "multiply", "divide", "sum"]
                },
                "left": quantity,
                "right": quantity,
                "values": { "type": "array", "items": quantity }
            },
            "required": ["operation"]
        })
    }

    async fn execute(&self, args: &Arguments) -> Result<ToolValue, ToolError> {
        let operation = args.text("operation")?;
        let result = match operation {
            "sum" => sum(args.quantity_list("values")?)?,
            "add" | "subtract" | "multiply" | "divide" => {
                binary(operation, args.quantity("left")?, args.quantity("right")?)?
            }
            other => {
                return Err(ToolError::InvalidParams(format!(
                    "Unknown operation: {}",
                    other
                )));
            }
        };
        Ok(ToolValue::Quantity(result))
    }
}

fn sum(values: Vec<&Quantity>) -> Result<Quantity, ToolError> {
    let unit = common_unit(values.iter().copied())
        .map_err(|(expected, actual)| ToolError::UnitMismatch { expected, actual })?
        .ok_or_else(|| ToolError::InvalidParams("values must not be empty".into()))?;
    Ok(Quantity::new(values.iter().map(|q| q.value).sum(), unit))
}

fn binary(operation: &str, left: &Quantity, right: &Quantity) -> Result<Quantity, ToolError> {
    match operation {
        "add" | "subtract" => {
            same_unit(left, right)?;
            let value = if operation == "add" {
                left.value + right.value
            } else {
                left.value - right.value
            };
            Ok(Quantity::new(value, left.unit.clone()))
        }
        "multiply" => match (&left.unit, &right.unit) {
            (Unit::Scalar, unit) | (unit, Unit::Scalar) => {
                Ok(Quantity::new(left.value * right.value, unit.clone()))
            }
            (_, actual) => Err(ToolError::UnitMismatch {
                expected: Unit::Scalar,
                actual: actual.clone(),
            }),
        },
        _ => {
            if right.value == 0.0 {
                return Err(ToolError::InvalidParams("division by zero".into()));
            }
            let value = left.value / right.value;
            if left.unit == right.unit {
                Ok(Quantity::scalar(value))
            } else if right.unit == Unit::Scalar {
                Ok(Quantity::new(value, left.unit.clone()))
            } else {
                Err(ToolError::UnitMismatch {
                    expected: left.unit.clone(),
                    actual: right.unit.clone(),
                })
            }
        }
    }
}

fn same_unit(left: &Quantity, right: &Quantity) -> Result<(), ToolError> {
    if left.unit != right.unit {
        return Err(ToolError::UnitMismatch {
            expected: left.unit.clone(),
            actual: right.unit.clone(),
        });
    }
    Ok(())
}
