// ABOUTME: Report generator - renders the final answer from the deliverable store.
// ABOUTME: Unresolved deliverables show the sentinel; no value is ever invented.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::deliverable::{FailureReason, RecordState, SENTINEL, UndeterminedCause};
use crate::store::DeliverableStore;
use crate::unit::Quantity;

/// What the report says about one deliverable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Entry {
    Value {
        value: Quantity,
    },
    Failed {
        reason: FailureReason,
    },
    /// Rendered as the sentinel. `cause` is `None` when no researcher ever
    /// picked the deliverable up.
    Undetermined {
        cause: Option<UndeterminedCause>,
    },
}

impl Entry {
    fn from_state(state: Option<&RecordState>) -> Self {
        match state {
            Some(RecordState::Resolved { value }) => Entry::Value {
                value: value.clone(),
            },
            Some(RecordState::Failed { reason }) => Entry::Failed {
                reason: reason.clone(),
            },
            Some(RecordState::Undetermined { cause }) => Entry::Undetermined {
                cause: Some(cause.clone()),
            },
            Some(RecordState::Unresolved | RecordState::Running) | None => {
                Entry::Undetermined { cause: None }
            }
        }
    }

    /// Whether a researcher worked on this deliverable.
    pub fn was_attempted(&self) -> bool {
        !matches!(self, Entry::Undetermined { cause: None })
    }
}

/// One report line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Line {
    pub key: String,
    pub entry: Entry,
}

/// The final structured answer, one line per deliverable in planner order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub lines: Vec<Line>,
}

/// Read `keys` from the store in the given order.
///
/// Keys the store does not know are reported as never attempted.
pub fn render(keys: &[String], store: &DeliverableStore) -> Report {
    let lines = keys
        .iter()
        .map(|key| {
            let record = store.get(key).ok();
            Line {
                key: key.clone(),
                entry: Entry::from_state(record.as_ref().map(|r| &r.state)),
            }
        })
        .collect();
    Report { lines }
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.lines.iter().find(|l| l.key == key).map(|l| &l.entry)
    }

    pub fn value(&self, key: &str) -> Option<&Quantity> {
        match self.get(key)? {
            Entry::Value { value } => Some(value),
            _ => None,
        }
    }

    /// Whether `key` resolved to within `tolerance` of `expected`, measured as
    /// `|actual - expected| / max(|expected|, 1)`. Units must match exactly.
    pub fn matches(&self, key: &str, expected: &Quantity, tolerance: f64) -> bool {
        match self.value(key) {
            Some(actual) if actual.unit == expected.unit => {
                (actual.value - expected.value).abs() / expected.value.abs().max(1.0) <= tolerance
            }
            _ => false,
        }
    }

    /// One bullet per deliverable.
    pub fn to_markdown(&self) -> String {
        if self.lines.is_empty() {
            return "_No deliverables._\n".to_string();
        }
        let mut out = String::new();
        for line in &self.lines {
            let text = match &line.entry {
                Entry::Value { value } => value.to_string(),
                Entry::Failed { reason } => format!("Failed: {}", reason),
                Entry::Undetermined { .. } => SENTINEL.to_string(),
            };
            let _ = writeln!(out, "- **{}**: {}", line.key, text);
        }
        out
    }

    /// `{"deliverables": {key: {"value", "unit"} | {"failed", "detail"} | "To be determined"}}`.
    pub fn to_json(&self) -> Value {
        let deliverables = self
            .lines
            .iter()
            .map(|line| {
                let value = match &line.entry {
                    Entry::Value { value } => json!({ "value": value.value, "unit": value.unit }),
                    Entry::Failed { reason } => {
                        json!({ "failed": reason.code(), "detail": reason.to_string() })
                    }
                    Entry::Undetermined { .. } => Value::String(SENTINEL.to_string()),
                };
                (line.key.clone(), value)
            })
            .collect::<serde_json::Map<_, _>>();
        json!({ "deliverables": deliverables })
    }
}

#[cfg(test)]
mod report_test;
