// ABOUTME: ScriptedEngine - a deterministic engine that replays queued decisions per key.
// ABOUTME: Drives tests and offline runs without a language model.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{Decision, DecisionContext, DraftPlan, PlanningEngine, ReasoningEngine};
use crate::deliverable::DeliverableSpec;
use crate::error::{EngineError, LlmError};

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Reply {
    Decide(Decision),
    /// Fail the call as if the engine could not be reached.
    Unavailable,
    /// Reply with something unusable.
    Invalid(String),
    /// Fail the call with a client error that retrying cannot fix.
    Rejected(String),
}

impl From<Decision> for Reply {
    fn from(decision: Decision) -> Self {
        Reply::Decide(decision)
    }
}

/// A call the engine received.
#[derive(Debug, Clone)]
pub struct Seen {
    pub spec: DeliverableSpec,
    pub step: usize,
    pub log_len: usize,
}

/// Replays scripted replies keyed by deliverable key.
///
/// A key whose script is exhausted (or was never scripted) gets a `Note`,
/// so the task keeps spending steps without finishing.
#[derive(Default)]
pub struct ScriptedEngine {
    scripts: Mutex<HashMap<String, VecDeque<Reply>>>,
    latency: HashMap<String, Duration>,
    plans: HashMap<String, DraftPlan>,
    seen: Mutex<Vec<Seen>>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue decisions for `key`, after any already queued.
    pub fn script(mut self, key: &str, replies: impl IntoIterator<Item = impl Into<Reply>>) -> Self {
        self.scripts
            .get_mut()
            .entry(key.to_string())
            .or_default()
            .extend(replies.into_iter().map(Into::into));
        self
    }

    /// Delay every call made for `key`.
    pub fn latency(mut self, key: &str, delay: Duration) -> Self {
        self.latency.insert(key.to_string(), delay);
        self
    }

    /// Answer `query` with `plan`. Unknown queries get an empty plan.
    pub fn plan(mut self, query: &str, plan: DraftPlan) -> Self {
        self.plans.insert(query.to_string(), plan);
        self
    }

    /// Every decide call received so far, in order.
    pub async fn seen(&self) -> Vec<Seen> {
        self.seen.lock().await.clone()
    }

    /// Number of decide calls received for `key`.
    pub async fn calls(&self, key: &str) -> usize {
        self.seen
            .lock()
            .await
            .iter()
            .filter(|s| s.spec.key() == key)
            .count()
    }
}

#[async_trait]
impl ReasoningEngine for ScriptedEngine {
    async fn decide(&self, ctx: &DecisionContext<'_>) -> Result<Decision, EngineError> {
        let key = ctx.spec.key();
        self.seen.lock().await.push(Seen {
            spec: ctx.spec.clone(),
            step: ctx.step,
            log_len: ctx.log.len(),
        });

        if let Some(delay) = self.latency.get(key) {
            tokio::time::sleep(*delay).await;
        }

        let reply = self
            .scripts
            .lock()
            .await
            .get_mut(key)
            .and_then(VecDeque::pop_front);

        match reply {
            Some(Reply::Decide(decision)) => Ok(decision),
            Some(Reply::Unavailable) => Err(EngineError::Unavailable(format!(
                "scripted outage for {}",
                key
            ))),
            Some(Reply::Invalid(message)) => Err(EngineError::InvalidDecision(message)),
            Some(Reply::Rejected(message)) => {
                Err(EngineError::Llm(LlmError::Configuration(message)))
            }
            None => Ok(Decision::Note(format!("no scripted decision for {}", key))),
        }
    }
}

#[async_trait]
impl PlanningEngine for ScriptedEngine {
    async fn draft_plan(&self, query: &str) -> Result<DraftPlan, EngineError> {
        Ok(self.plans.get(query).cloned().unwrap_or_default())
    }
}
