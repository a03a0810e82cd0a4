// ABOUTME: Tool call and tool result types - what crosses the tool invocation boundary.
// ABOUTME: Arguments are typed; numbers always travel as unit-tagged quantities.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::unit::Quantity;

/// A single typed argument value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgValue {
    Quantity(Quantity),
    List(Vec<ArgValue>),
    Text(String),
    Flag(bool),
    /// The literal value produced by an earlier step of the same task,
    /// addressed by its log index. Resolved before the tool sees it.
    Ref(usize),
}

impl ArgValue {
    /// Parse a loosely structured JSON value as produced by a language model.
    ///
    /// Accepted shapes: `{"value": n, "unit": "u"}`, `{"ref": i}`, strings,
    /// booleans and arrays of those. Bare numbers are rejected because they
    /// carry no unit.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ToolError> {
        use serde_json::Value;

        match value {
            Value::String(s) => Ok(ArgValue::Text(s.clone())),
            Value::Bool(b) => Ok(ArgValue::Flag(*b)),
            Value::Array(items) => items
                .iter()
                .map(ArgValue::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(ArgValue::List),
            Value::Object(map) => {
                if let Some(index) = map.get("ref") {
                    let index = index.as_u64().ok_or_else(|| {
                        ToolError::InvalidParams(format!("ref must be a step index, got {}", index))
                    })?;
                    return Ok(ArgValue::Ref(index as usize));
                }
                let number = map.get("value").and_then(Value::as_f64);
                let unit = map.get("unit").and_then(Value::as_str);
                match (number, unit) {
                    (Some(number), Some(unit)) => Ok(ArgValue::Quantity(Quantity::new(number, unit))),
                    _ => Err(ToolError::InvalidParams(format!(
                        "expected {{\"value\", \"unit\"}} or {{\"ref\"}}, got {}",
                        value
                    ))),
                }
            }
            Value::Number(n) => Err(ToolError::InvalidParams(format!(
                "number {} has no unit; pass {{\"value\": {}, \"unit\": ...}}",
                n, n
            ))),
            Value::Null => Err(ToolError::InvalidParams("null argument".into())),
        }
    }

    /// Visit every quantity literal, including those nested in lists.
    pub fn quantities(&self) -> Vec<&Quantity> {
        match self {
            ArgValue::Quantity(q) => vec![q],
            ArgValue::List(items) => items.iter().flat_map(ArgValue::quantities).collect(),
            _ => Vec::new(),
        }
    }
}

/// Named arguments of a tool call, in a stable order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Arguments(BTreeMap<String, ArgValue>);

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, name: impl Into<String>, value: ArgValue) -> Self {
        self.0.insert(name.into(), value);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: ArgValue) {
        self.0.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.0.get(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &ArgValue)> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut ArgValue)> {
        self.0.iter_mut()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parse a JSON object of arguments.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, ToolError> {
        let object = match value {
            serde_json::Value::Object(object) => object,
            serde_json::Value::Null => return Ok(Self::new()),
            other => {
                return Err(ToolError::InvalidParams(format!(
                    "arguments must be an object, got {}",
                    other
                )));
            }
        };
        let mut args = Self::new();
        for (name, raw) in object {
            args.insert(name.clone(), ArgValue::from_json(raw)?);
        }
        Ok(args)
    }

    /// Required quantity argument.
    pub fn quantity(&self, name: &str) -> Result<&Quantity, ToolError> {
        match self.require(name)? {
            ArgValue::Quantity(q) => Ok(q),
            other => Err(wrong_type(name, "quantity", other)),
        }
    }

    /// Required list of quantities.
    pub fn quantity_list(&self, name: &str) -> Result<Vec<&Quantity>, ToolError> {
        match self.require(name)? {
            ArgValue::List(items) => items
                .iter()
                .map(|item| match item {
                    ArgValue::Quantity(q) => Ok(q),
                    other => Err(wrong_type(name, "list of quantities", other)),
                })
                .collect(),
            other => Err(wrong_type(name, "list of quantities", other)),
        }
    }

    /// Required text argument.
    pub fn text(&self, name: &str) -> Result<&str, ToolError> {
        match self.require(name)? {
            ArgValue::Text(s) => Ok(s),
            other => Err(wrong_type(name, "text", other)),
        }
    }

    /// Every quantity literal across all arguments.
    pub fn quantities(&self) -> Vec<&Quantity> {
        self.0.values().flat_map(ArgValue::quantities).collect()
    }

    fn require(&self, name: &str) -> Result<&ArgValue, ToolError> {
        self.0
            .get(name)
            .ok_or_else(|| ToolError::InvalidParams(format!("Missing required parameter: {}", name)))
    }
}

fn wrong_type(name: &str, expected: &str, got: &ArgValue) -> ToolError {
    ToolError::InvalidParams(format!("{} must be a {}, got {:?}", name, expected, got))
}

/// A request to invoke a named tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub name: String,
    pub arguments: Arguments,
}

impl ToolCall {
    pub fn new(name: impl Into<String>, arguments: Arguments) -> Self {
        Self {
            name: name.into(),
            arguments,
        }
    }
}

/// Value produced by a tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolValue {
    Quantity(Quantity),
    Text(String),
}

impl ToolValue {
    pub fn quantity(&self) -> Option<&Quantity> {
        match self {
            ToolValue::Quantity(q) => Some(q),
            ToolValue::Text(_) => None,
        }
    }
}

impl fmt::Display for ToolValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ToolValue::Quantity(q) => write!(f, "{}", q),
            ToolValue::Text(text) => f.write_str(text),
        }
    }
}

/// Which task step produced a result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Provenance {
    /// Key of the deliverable whose researcher made the call.
    pub task: String,
    /// Index of the producing entry in that task's log.
    pub step: usize,
    /// Name of the tool that produced the value.
    pub tool: String,
}

/// Result of a tool invocation, tagged with where it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub value: ToolValue,
    pub provenance: Provenance,
}
