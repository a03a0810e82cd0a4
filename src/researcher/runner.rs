// ABOUTME: Researcher - runs the bounded decide/act loop that resolves one deliverable.
// ABOUTME: Delegation recurses into a nested researcher sharing the same store.

use std::sync::Arc;

use async_recursion::async_recursion;
use tracing::{debug, info, warn};

use super::{LogEntry, ResearcherState};
use crate::config::EngineConfig;
use crate::deliverable::{
    DeliverableRecord, DeliverableSpec, FailureReason, RecordState, SpecOverrides,
    UndeterminedCause,
};
use crate::engine::{Decision, DecisionContext, ReasoningEngine};
use crate::error::{DossierError, EngineError, StoreError, ToolError};
use crate::llm::ToolDefinition;
use crate::store::DeliverableStore;
use crate::tool::{ArgValue, Arguments, Provenance, Registry, ToolCall, ToolResult};
use crate::trace::{TraceEvent, Tracer};
use crate::unit::Quantity;

/// How a task's loop ended.
#[derive(Debug)]
enum Outcome {
    Resolved(Quantity),
    Failed(FailureReason),
    Undetermined(UndeterminedCause),
}

/// What the loop does after a step.
enum Flow {
    Continue,
    Finish(Outcome),
}

/// Resolves deliverables by driving a reasoning engine against the tool set.
///
/// Cloning is cheap; clones share the engine, tools, store and tracer.
#[derive(Clone)]
pub struct Researcher {
    engine: Arc<dyn ReasoningEngine>,
    tools: Registry,
    store: DeliverableStore,
    tracer: Tracer,
    config: Arc<EngineConfig>,
}

impl Researcher {
    pub fn new(
        engine: Arc<dyn ReasoningEngine>,
        tools: Registry,
        store: DeliverableStore,
        tracer: Tracer,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            engine,
            tools,
            store,
            tracer,
            config,
        }
    }

    pub fn store(&self) -> &DeliverableStore {
        &self.store
    }

    /// Resolve a registered spec and return its terminal record.
    ///
    /// Deliverable-level problems end up on the record. Only store consistency
    /// violations are returned as errors.
    #[async_recursion]
    pub async fn resolve(&self, spec: &DeliverableSpec) -> Result<DeliverableRecord, DossierError> {
        let key = spec.key();
        self.store.start(key)?;
        self.mutated(key, RecordState::Running).await;
        self.tracer
            .emit(TraceEvent::TaskStarted {
                key: key.to_string(),
                depth: spec.depth(),
            })
            .await;
        info!(key, depth = spec.depth(), "Researcher started");

        let mut state = ResearcherState::new(spec.clone());
        let outcome = self.run(&mut state).await?;
        let record = self.finish(key, outcome).await?;

        info!(key, steps = state.steps(), state = %record.state, "Researcher finished");
        self.tracer
            .emit(TraceEvent::TaskFinished {
                key: key.to_string(),
                steps: state.steps(),
                state: record.state.clone(),
            })
            .await;
        Ok(record)
    }

    async fn run(&self, state: &mut ResearcherState) -> Result<Outcome, DossierError> {
        let definitions = self.tools.to_definitions().await;
        let max_steps = self.config.max_steps;

        while state.steps() < max_steps {
            let decision = match self.decide(state, &definitions).await {
                Ok(decision) => decision,
                Err(EngineError::InvalidDecision(reason)) => {
                    let step = state.begin_step();
                    warn!(key = state.spec().key(), step, %reason, "Engine returned an invalid decision");
                    self.step_taken(state, step, "invalid").await;
                    state.push(LogEntry::Rejected { step, reason });
                    continue;
                }
                Err(e) => {
                    // Only outages are retried; a client error fails on the first attempt.
                    let attempts = match e {
                        EngineError::Unavailable(_) => self.config.engine_retries + 1,
                        _ => 1,
                    };
                    warn!(key = state.spec().key(), error = %e, attempts, "Reasoning engine unavailable");
                    return Ok(Outcome::Undetermined(UndeterminedCause::EngineUnavailable {
                        attempts,
                    }));
                }
            };

            let step = state.begin_step();
            self.step_taken(state, step, decision.kind()).await;

            if let Flow::Finish(outcome) = self.act(state, step, decision).await? {
                return Ok(outcome);
            }
        }

        debug!(key = state.spec().key(), max_steps, "Step budget exhausted");
        Ok(Outcome::Undetermined(UndeterminedCause::StepBudgetExhausted {
            steps: state.steps(),
        }))
    }

    /// Ask the engine for a decision, retrying outages without spending steps.
    ///
    /// Client errors (bad credentials, malformed requests) are not retried.
    async fn decide(
        &self,
        state: &ResearcherState,
        tools: &[ToolDefinition],
    ) -> Result<Decision, EngineError> {
        let ctx = DecisionContext {
            spec: state.spec(),
            log: state.log(),
            tools,
            step: state.steps(),
            max_steps: self.config.max_steps,
            max_depth: self.config.max_depth,
        };

        let mut attempt = 0;
        loop {
            match self.engine.decide(&ctx).await {
                Err(e @ EngineError::Unavailable(_)) if attempt < self.config.engine_retries =>
                {
                    attempt += 1;
                    debug!(key = ctx.spec.key(), attempt, error = %e, "Retrying reasoning engine");
                }
                other => return other,
            }
        }
    }

    async fn act(
        &self,
        state: &mut ResearcherState,
        step: usize,
        decision: Decision,
    ) -> Result<Flow, DossierError> {
        match decision {
            Decision::Tool(call) => Ok(self.call_tool(state, step, call).await),
            Decision::Delegate(overrides) => {
                self.delegate(state, step, overrides).await?;
                Ok(Flow::Continue)
            }
            Decision::Store { value } => Ok(self.store_value(state, step, value)),
            Decision::Abort { reason } => Ok(Flow::Finish(Outcome::Failed(FailureReason::Aborted {
                message: reason,
            }))),
            Decision::Note(text) => {
                state.push(LogEntry::Note { step, text });
                Ok(Flow::Continue)
            }
            Decision::Answer(text) => {
                debug!(key = state.spec().key(), answer = %text, "Final answer without a stored value");
                Ok(Flow::Finish(Outcome::Undetermined(UndeterminedCause::NoValueStored)))
            }
        }
    }

    async fn call_tool(&self, state: &mut ResearcherState, step: usize, mut call: ToolCall) -> Flow {
        let key = state.spec().key().to_string();
        let checked = self.prepare(state, &mut call.arguments);

        let outcome = match checked {
            Ok(()) => self.invoke(&key, step, &call).await,
            Err(e) => Err(e),
        };

        self.tracer
            .emit(TraceEvent::ToolInvoked {
                key: key.clone(),
                step,
                tool: call.name.clone(),
                arguments: call.arguments.clone(),
                outcome: outcome
                    .as_ref()
                    .map(|r| r.value.clone())
                    .map_err(|e| e.to_string()),
            })
            .await;

        match outcome {
            Ok(result) => {
                debug!(key = %key, step, tool = %call.name, value = %result.value, "Tool returned");
                state.push(LogEntry::Tool {
                    step,
                    call,
                    outcome: Ok(result),
                });
                Flow::Continue
            }
            Err(ToolError::UnitMismatch { expected, actual }) => {
                warn!(key = %key, step, tool = %call.name, %expected, %actual, "Unit mismatch in calculation chain");
                Flow::Finish(Outcome::Failed(FailureReason::UnitMismatch { expected, actual }))
            }
            Err(e) => {
                warn!(key = %key, step, tool = %call.name, error = %e, "Tool call failed");
                state.push(LogEntry::Tool {
                    step,
                    call,
                    outcome: Err(e.to_string()),
                });
                Flow::Continue
            }
        }
    }

    /// Check literal inputs, then swap step references for their values.
    fn prepare(
        &self,
        state: &ResearcherState,
        args: &mut Arguments,
    ) -> Result<(), ToolError> {
        if self.config.require_traceable_inputs {
            state.check_traceable(args)?;
        }
        state.resolve_refs(args)
    }

    async fn invoke(&self, key: &str, step: usize, call: &ToolCall) -> Result<ToolResult, ToolError> {
        let provenance = Provenance {
            task: key.to_string(),
            step,
            tool: call.name.clone(),
        };

        let mut attempt = 0;
        loop {
            match self.tools.invoke(call, provenance.clone()).await {
                Err(e) if e.is_retryable() && attempt < self.config.tool_retries => {
                    attempt += 1;
                    debug!(key, step, tool = %call.name, attempt, error = %e, "Retrying tool");
                }
                other => return other,
            }
        }
    }

    async fn delegate(
        &self,
        state: &mut ResearcherState,
        step: usize,
        overrides: SpecOverrides,
    ) -> Result<(), DossierError> {
        let child_key = state.next_child_key();
        let child = state.spec().child(child_key.as_str(), overrides);

        self.store.register_spec(&child)?;
        self.tracer
            .emit(TraceEvent::SpecCreated {
                key: child_key.clone(),
                depth: child.depth(),
                parent: child.parent().map(str::to_string),
            })
            .await;
        self.tracer
            .emit(TraceEvent::Delegated {
                parent: state.spec().key().to_string(),
                child: child_key.clone(),
                depth: child.depth(),
            })
            .await;

        let max_depth = self.config.max_depth;
        let record = if child.depth() >= max_depth {
            warn!(parent = state.spec().key(), child = %child_key, depth = child.depth(), max_depth, "Delegation refused at depth ceiling");
            let reason = FailureReason::DepthExceeded {
                depth: child.depth(),
                max_depth,
            };
            self.store.set_failed(&child_key, reason.clone())?;
            let failed = RecordState::Failed { reason };
            self.mutated(&child_key, failed).await;
            self.store.get(&child_key)?
        } else {
            info!(parent = state.spec().key(), child = %child_key, depth = child.depth(), "Delegating");
            self.resolve(&child).await?
        };

        state.push(LogEntry::Delegated {
            step,
            child: child_key,
            state: record.state,
        });
        Ok(())
    }

    fn store_value(&self, state: &mut ResearcherState, step: usize, mut value: ArgValue) -> Flow {
        let checked = if self.config.require_traceable_inputs {
            state.check_traceable_value(&value)
        } else {
            Ok(())
        };

        match checked.and_then(|()| state.resolve_value(&mut value)) {
            Ok(()) => match value {
                ArgValue::Quantity(q) => Flow::Finish(Outcome::Resolved(q)),
                other => {
                    state.push(LogEntry::Rejected {
                        step,
                        reason: format!("store needs a quantity, got {:?}", other),
                    });
                    Flow::Continue
                }
            },
            Err(e) => {
                warn!(key = state.spec().key(), step, error = %e, "Store rejected");
                state.push(LogEntry::Rejected {
                    step,
                    reason: e.to_string(),
                });
                Flow::Continue
            }
        }
    }

    /// Apply the loop's outcome to the store and return the terminal record.
    async fn finish(&self, key: &str, outcome: Outcome) -> Result<DeliverableRecord, DossierError> {
        match outcome {
            Outcome::Resolved(value) => match self.store.set_resolved(key, value) {
                Ok(()) => {}
                Err(StoreError::UnitMismatch {
                    expected, actual, ..
                }) => {
                    warn!(key, %expected, %actual, "Stored value has the wrong unit");
                    self.store
                        .set_failed(key, FailureReason::UnitMismatch { expected, actual })?;
                }
                Err(e) => return Err(e.into()),
            },
            Outcome::Failed(reason) => self.store.set_failed(key, reason)?,
            Outcome::Undetermined(cause) => self.store.set_undetermined(key, cause)?,
        }

        let record = self.store.get(key)?;
        self.mutated(key, record.state.clone()).await;
        Ok(record)
    }

    async fn step_taken(&self, state: &ResearcherState, step: usize, kind: &str) {
        debug!(key = state.spec().key(), depth = state.depth(), step, kind, "Step");
        self.tracer
            .emit(TraceEvent::StepTaken {
                key: state.spec().key().to_string(),
                step,
                kind: kind.to_string(),
            })
            .await;
    }

    async fn mutated(&self, key: &str, state: RecordState) {
        self.tracer
            .emit(TraceEvent::StoreMutated {
                key: key.to_string(),
                state,
            })
            .await;
    }
}
