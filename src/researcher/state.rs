// ABOUTME: ResearcherState - a task's private working memory and step log.
// ABOUTME: Resolves step references and enforces literal chaining between steps.

use serde::{Deserialize, Serialize};

use crate::deliverable::{DeliverableSpec, RecordState};
use crate::error::ToolError;
use crate::tool::{ArgValue, Arguments, ToolCall, ToolResult};
use crate::unit::Quantity;

/// One entry of a task's log. Every non-terminal step appends exactly one,
/// so an entry's index equals its step number.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entry", rename_all = "snake_case")]
pub enum LogEntry {
    Tool {
        step: usize,
        call: ToolCall,
        outcome: Result<ToolResult, String>,
    },
    /// A nested task finished (or was refused) with this terminal state.
    Delegated {
        step: usize,
        child: String,
        state: RecordState,
    },
    Note {
        step: usize,
        text: String,
    },
    /// The step's decision could not be carried out.
    Rejected {
        step: usize,
        reason: String,
    },
}

impl LogEntry {
    pub fn step(&self) -> usize {
        match self {
            LogEntry::Tool { step, .. }
            | LogEntry::Delegated { step, .. }
            | LogEntry::Note { step, .. }
            | LogEntry::Rejected { step, .. } => *step,
        }
    }

    /// The quantity this step produced, if any.
    pub fn value(&self) -> Option<&Quantity> {
        match self {
            LogEntry::Tool {
                outcome: Ok(result),
                ..
            } => result.value.quantity(),
            LogEntry::Delegated {
                state: RecordState::Resolved { value },
                ..
            } => Some(value),
            _ => None,
        }
    }

    /// One-line rendering for prompts and logs.
    pub fn describe(&self) -> String {
        match self {
            LogEntry::Tool { step, call, outcome } => {
                let args = serde_json::to_string(&call.arguments).unwrap_or_default();
                match outcome {
                    Ok(result) => format!("[{}] {}({}) -> {}", step, call.name, args, result.value),
                    Err(e) => format!("[{}] {}({}) failed: {}", step, call.name, args, e),
                }
            }
            LogEntry::Delegated { step, child, state } => {
                format!("[{}] delegated {} -> {}", step, child, state)
            }
            LogEntry::Note { step, text } => format!("[{}] note: {}", step, text),
            LogEntry::Rejected { step, reason } => format!("[{}] rejected: {}", step, reason),
        }
    }
}

/// Working memory of one researcher task. Owned by that task alone.
#[derive(Debug, Clone)]
pub struct ResearcherState {
    spec: DeliverableSpec,
    log: Vec<LogEntry>,
    steps: usize,
    delegations: usize,
}

impl ResearcherState {
    pub fn new(spec: DeliverableSpec) -> Self {
        Self {
            spec,
            log: Vec::new(),
            steps: 0,
            delegations: 0,
        }
    }

    pub fn spec(&self) -> &DeliverableSpec {
        &self.spec
    }

    pub fn depth(&self) -> usize {
        self.spec.depth()
    }

    pub fn log(&self) -> &[LogEntry] {
        &self.log
    }

    /// Steps taken so far, including a terminal one.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Claim the next step number.
    pub fn begin_step(&mut self) -> usize {
        let step = self.steps;
        self.steps += 1;
        step
    }

    pub fn push(&mut self, entry: LogEntry) {
        debug_assert_eq!(entry.step(), self.log.len());
        self.log.push(entry);
    }

    /// Key for the next delegated child: `<key>.<n>`, n counting from 1.
    pub fn next_child_key(&mut self) -> String {
        self.delegations += 1;
        format!("{}.{}", self.spec.key(), self.delegations)
    }

    /// The literal quantity produced by `step`.
    pub fn lookup(&self, step: usize) -> Result<&Quantity, ToolError> {
        let entry = self
            .log
            .get(step)
            .ok_or_else(|| ToolError::InvalidParams(format!("step {} does not exist yet", step)))?;
        entry
            .value()
            .ok_or_else(|| ToolError::InvalidParams(format!("step {} produced no quantity", step)))
    }

    /// Whether `q` is, bit for bit and tag for tag, a value an earlier step produced.
    pub fn is_traced(&self, q: &Quantity) -> bool {
        self.log
            .iter()
            .filter_map(LogEntry::value)
            .any(|produced| produced.is_literal(q))
    }

    /// Reject scaled literals that did not come out of an earlier step.
    ///
    /// Dimensionless literals (rates, years, ratios) are inputs in their own right.
    pub fn check_traceable(&self, args: &Arguments) -> Result<(), ToolError> {
        self.check_literals(args.quantities())
    }

    pub fn check_traceable_value(&self, value: &ArgValue) -> Result<(), ToolError> {
        self.check_literals(value.quantities())
    }

    fn check_literals(&self, literals: Vec<&Quantity>) -> Result<(), ToolError> {
        match literals
            .into_iter()
            .find(|q| !q.unit.is_dimensionless() && !self.is_traced(q))
        {
            Some(q) => Err(ToolError::UntracedValue(q.to_string())),
            None => Ok(()),
        }
    }

    /// Replace every `Ref` in `args` with the literal it points at.
    pub fn resolve_refs(&self, args: &mut Arguments) -> Result<(), ToolError> {
        for (_, value) in args.iter_mut() {
            self.resolve_value(value)?;
        }
        Ok(())
    }

    pub fn resolve_value(&self, value: &mut ArgValue) -> Result<(), ToolError> {
        match value {
            ArgValue::Ref(step) => {
                *value = ArgValue::Quantity(self.lookup(*step)?.clone());
            }
            ArgValue::List(items) => {
                for item in items {
                    self.resolve_value(item)?;
                }
            }
            ArgValue::Quantity(_) | ArgValue::Text(_) | ArgValue::Flag(_) => {}
        }
        Ok(())
    }
}
