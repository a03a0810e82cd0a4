// ABOUTME: LlmEngine - adapts an LlmClient into reasoning and planning engines.
// ABOUTME: Control actions are exposed to the model as extra tools.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use serde_json::{Value, json};
use tracing::debug;

use super::{Decision, DecisionContext, DraftPlan, PlanningEngine, ReasoningEngine};
use crate::config::LlmSettings;
use crate::deliverable::{DataLevel, SpecOverrides};
use crate::error::{EngineError, LlmError};
use crate::llm::{LlmClient, Message, Request, ToolDefinition};
use crate::tool::{ArgValue, Arguments, ToolCall};
use crate::unit::Unit;

pub const STORE_TOOL: &str = "store_deliverable";
pub const DELEGATE_TOOL: &str = "delegate";
pub const ABORT_TOOL: &str = "abort";
pub const THINK_TOOL: &str = "think";

static JSON_BLOCK: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(\{.*?\})\s*```"));

const RESEARCH_PROMPT: &str = "You resolve exactly one numeric deliverable. \
Take one action per turn by calling a tool. Every number carries a unit tag \
(absolute, thousands, millions, billions, percent, scalar); never rescale a value. \
Feed earlier results into later calls with {\"ref\": <step>} instead of retyping them. \
When the value is known, call store_deliverable. If it cannot be found, call abort.";

const PLANNING_PROMPT: &str = "Identify every numeric deliverable the query asks for. \
Reply with a single ```json block of the form \
{\"outline\": \"<research plan>\", \"deliverables\": [{\"key\": \"snake_case\", \
\"description\": \"...\", \"data_level\": \"raw|aggregate|derived\", \"data_source\": \"...\", \
\"calculation_guidance\": \"...\", \"expected_unit\": \"millions\"}]}. \
Use an empty list when the query asks for no numbers.";

/// Reasoning and planning over any chat-completion client.
pub struct LlmEngine {
    client: Arc<dyn LlmClient>,
    settings: LlmSettings,
}

impl LlmEngine {
    pub fn new(client: Arc<dyn LlmClient>, settings: LlmSettings) -> Self {
        Self { client, settings }
    }

    fn request(&self) -> Request {
        Request::new(&self.settings.model)
            .max_tokens(self.settings.max_tokens)
            .temperature(self.settings.temperature)
    }

    async fn send(&self, req: Request) -> Result<crate::llm::Response, EngineError> {
        self.client.create_message(&req).await.map_err(|e| match e {
            LlmError::Http(_) => EngineError::Unavailable(e.to_string()),
            LlmError::Api { status, .. } if status == 429 || status >= 500 => {
                EngineError::Unavailable(e.to_string())
            }
            other => EngineError::Llm(other),
        })
    }
}

/// Tools the model uses to steer the task rather than compute.
pub fn control_tools(can_delegate: bool) -> Vec<ToolDefinition> {
    let quantity = json!({
        "type": "object",
        "description": "{\"ref\": step} or {\"value\": number, \"unit\": string}"
    });
    let mut tools = vec![
        ToolDefinition {
            name: STORE_TOOL.into(),
            description: "Store the final value of this deliverable and finish.".into(),
            input_schema: json!({
                "type": "object",
                "properties": { "value": quantity },
                "required": ["value"]
            }),
        },
        ToolDefinition {
            name: ABORT_TOOL.into(),
            description: "Give up on this deliverable with a reason.".into(),
            input_schema: json!({
                "type": "object",
                "properties": { "reason": { "type": "string" } },
                "required": ["reason"]
            }),
        },
        ToolDefinition {
            name: THINK_TOOL.into(),
            description: "Write down reasoning without acting. Uses a step.".into(),
            input_schema: json!({
                "type": "object",
                "properties": { "note": { "type": "string" } },
                "required": ["note"]
            }),
        },
    ];
    if can_delegate {
        tools.push(ToolDefinition {
            name: DELEGATE_TOOL.into(),
            description: "Resolve a sub-deliverable with a nested researcher. Omitted fields \
                          are inherited from this deliverable."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "description": { "type": "string" },
                    "data_level": { "type": "string", "enum": ["raw", "aggregate", "derived"] },
                    "data_source": { "type": "string" },
                    "calculation_guidance": { "type": "string" },
                    "expected_unit": { "type": "string" }
                },
                "required": ["description"]
            }),
        });
    }
    tools
}

fn render_task(ctx: &DecisionContext<'_>) -> String {
    let spec = ctx.spec;
    let mut out = format!(
        "Deliverable: {}\nDescription: {}\nData level: {:?}\nData source: {}\nGuidance: {}\n",
        spec.key(),
        spec.description(),
        spec.data_level(),
        spec.data_source(),
        spec.calculation_guidance(),
    );
    if let Some(unit) = spec.expected_unit() {
        out.push_str(&format!("Store the value in unit: {}\n", unit));
    }
    out.push_str(&format!(
        "Depth {} of {}. Step {} of {}.\n",
        spec.depth(),
        ctx.max_depth,
        ctx.step + 1,
        ctx.max_steps
    ));
    if ctx.log.is_empty() {
        out.push_str("No steps taken yet.\n");
    } else {
        out.push_str("Steps so far:\n");
        for entry in ctx.log {
            out.push_str(&entry.describe());
            out.push('\n');
        }
    }
    out
}

fn text_field<'a>(input: &'a Value, name: &str) -> Result<&'a str, EngineError> {
    input
        .get(name)
        .and_then(Value::as_str)
        .ok_or_else(|| EngineError::InvalidDecision(format!("missing string field '{}'", name)))
}

fn optional_text(input: &Value, name: &str) -> Option<String> {
    input.get(name).and_then(Value::as_str).map(str::to_string)
}

/// Turn one model tool call into a decision.
pub fn parse_decision(name: &str, input: &Value) -> Result<Decision, EngineError> {
    let invalid = |e: crate::error::ToolError| EngineError::InvalidDecision(e.to_string());
    match name {
        STORE_TOOL => {
            let value = input
                .get("value")
                .ok_or_else(|| EngineError::InvalidDecision("store needs a value".into()))?;
            Ok(Decision::Store {
                value: ArgValue::from_json(value).map_err(invalid)?,
            })
        }
        ABORT_TOOL => Ok(Decision::Abort {
            reason: text_field(input, "reason")?.to_string(),
        }),
        THINK_TOOL => Ok(Decision::Note(text_field(input, "note")?.to_string())),
        DELEGATE_TOOL => {
            let data_level = match input.get("data_level") {
                Some(level) => Some(serde_json::from_value::<DataLevel>(level.clone()).map_err(
                    |e| EngineError::InvalidDecision(format!("bad data_level: {}", e)),
                )?),
                None => None,
            };
            Ok(Decision::Delegate(SpecOverrides {
                description: text_field(input, "description")?.to_string(),
                data_level,
                data_source: optional_text(input, "data_source"),
                calculation_guidance: optional_text(input, "calculation_guidance"),
                expected_unit: optional_text(input, "expected_unit").map(|u| Some(Unit::from(u))),
            }))
        }
        tool => Ok(Decision::Tool(ToolCall::new(
            tool,
            Arguments::from_json(input).map_err(invalid)?,
        ))),
    }
}

/// Pull the plan JSON out of a reply, fenced or bare.
pub fn extract_plan(text: &str) -> Result<DraftPlan, EngineError> {
    let pattern = JSON_BLOCK
        .as_ref()
        .map_err(|e| EngineError::InvalidDecision(e.to_string()))?;
    let body = pattern
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(text.trim());
    serde_json::from_str(body)
        .map_err(|e| EngineError::InvalidDecision(format!("unreadable plan: {}", e)))
}

#[async_trait]
impl ReasoningEngine for LlmEngine {
    async fn decide(&self, ctx: &DecisionContext<'_>) -> Result<Decision, EngineError> {
        let tools = ctx
            .tools
            .iter()
            .cloned()
            .chain(control_tools(ctx.can_delegate()));
        let req = self
            .request()
            .system(RESEARCH_PROMPT)
            .message(Message::user(render_task(ctx)))
            .tools(tools);

        let response = self.send(req).await?;
        debug!(key = ctx.spec.key(), step = ctx.step, stop = ?response.stop_reason, "Engine replied");

        match response.first_tool_use() {
            Some((name, input)) => parse_decision(name, input),
            None => Ok(Decision::Answer(response.text())),
        }
    }
}

#[async_trait]
impl PlanningEngine for LlmEngine {
    async fn draft_plan(&self, query: &str) -> Result<DraftPlan, EngineError> {
        let req = self
            .request()
            .system(PLANNING_PROMPT)
            .message(Message::user(query));
        let response = self.send(req).await?;
        extract_plan(&response.text())
    }
}
