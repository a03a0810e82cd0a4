// ABOUTME: Supervisor - registers top-level deliverables and fans them out to researchers.
// ABOUTME: Bounds concurrency and wall-clock time; reports records in planner order.

use std::collections::HashMap;
use std::sync::Arc;

use futures::{StreamExt, TryStreamExt, stream};
use tracing::{info, warn};
use uuid::Uuid;

use crate::config::EngineConfig;
use crate::deliverable::{
    DeliverableRecord, DeliverableSpec, FailureReason, RecordState, UndeterminedCause,
};
use crate::engine::ReasoningEngine;
use crate::error::DossierError;
use crate::planner::Plan;
use crate::report::{Report, render};
use crate::researcher::Researcher;
use crate::store::DeliverableStore;
use crate::tool::Registry;
use crate::trace::{TraceEvent, Tracer};

/// Outcome of one run: every top-level record, in planner order.
#[derive(Clone)]
pub struct RunSummary {
    pub run_id: Uuid,
    keys: Vec<String>,
    records: HashMap<String, DeliverableRecord>,
    store: DeliverableStore,
}

impl RunSummary {
    /// Top-level keys in planner order.
    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn get(&self, key: &str) -> Option<&DeliverableRecord> {
        self.records.get(key)
    }

    /// Top-level records in planner order.
    pub fn records(&self) -> impl Iterator<Item = &DeliverableRecord> {
        self.keys.iter().filter_map(|k| self.records.get(k))
    }

    /// The run's store, including delegated records.
    pub fn store(&self) -> &DeliverableStore {
        &self.store
    }

    pub fn report(&self) -> Report {
        render(&self.keys, &self.store)
    }
}

/// Dispatches one run's deliverables.
///
/// Each supervisor owns a fresh store and run id; build one per run.
pub struct Supervisor {
    researcher: Researcher,
    store: DeliverableStore,
    tracer: Tracer,
    config: Arc<EngineConfig>,
}

impl Supervisor {
    pub fn new(engine: Arc<dyn ReasoningEngine>, tools: Registry, config: EngineConfig) -> Self {
        let store = DeliverableStore::new();
        let tracer = Tracer::new();
        let config = Arc::new(config);
        let researcher = Researcher::new(
            engine,
            tools,
            store.clone(),
            tracer.clone(),
            Arc::clone(&config),
        );
        Self {
            researcher,
            store,
            tracer,
            config,
        }
    }

    /// Register trace sinks here before calling `run`.
    pub fn tracer(&self) -> &Tracer {
        &self.tracer
    }

    pub fn store(&self) -> &DeliverableStore {
        &self.store
    }

    /// Run a planner's output.
    pub async fn run_plan(&self, plan: &Plan) -> Result<RunSummary, DossierError> {
        self.run(&plan.specs).await
    }

    /// Register every spec, then resolve them with at most `fan_out` in flight.
    ///
    /// Returns an error only when the store's invariants are violated (a
    /// duplicate key, a second terminal write) or the configuration is invalid.
    pub async fn run(&self, specs: &[DeliverableSpec]) -> Result<RunSummary, DossierError> {
        self.config.validate()?;
        let run_id = self.tracer.run_id();
        info!(%run_id, deliverables = specs.len(), fan_out = self.config.fan_out, "Run started");

        for spec in specs {
            self.store.register_spec(spec)?;
            self.tracer
                .emit(TraceEvent::SpecCreated {
                    key: spec.key().to_string(),
                    depth: spec.depth(),
                    parent: spec.parent().map(str::to_string),
                })
                .await;
        }

        let finished: Vec<DeliverableRecord> = stream::iter(specs)
            .map(|spec| self.dispatch(spec))
            .buffer_unordered(self.config.fan_out)
            .try_collect()
            .await?;

        let keys: Vec<String> = specs.iter().map(|s| s.key().to_string()).collect();
        let records = finished
            .into_iter()
            .map(|r| (r.key.clone(), r))
            .collect::<HashMap<_, _>>();
        info!(%run_id, "Run finished");

        Ok(RunSummary {
            run_id,
            keys,
            records,
            store: self.store.clone(),
        })
    }

    async fn dispatch(&self, spec: &DeliverableSpec) -> Result<DeliverableRecord, DossierError> {
        let key = spec.key();
        let max_depth = self.config.max_depth;
        if spec.depth() >= max_depth {
            warn!(key, depth = spec.depth(), max_depth, "Deliverable is beyond the depth ceiling");
            let reason = FailureReason::DepthExceeded {
                depth: spec.depth(),
                max_depth,
            };
            self.store.set_failed(key, reason.clone())?;
            self.tracer
                .emit(TraceEvent::StoreMutated {
                    key: key.to_string(),
                    state: RecordState::Failed { reason },
                })
                .await;
            return Ok(self.store.get(key)?);
        }

        let Some(limit) = self.config.task_timeout() else {
            return self.researcher.resolve(spec).await;
        };

        match tokio::time::timeout(limit, self.researcher.resolve(spec)).await {
            Ok(result) => result,
            Err(_) => {
                let cause = UndeterminedCause::Timeout {
                    after_ms: limit.as_millis() as u64,
                };
                let expired = self.store.expire_subtree(spec.root(), cause.clone());
                warn!(key, after_ms = limit.as_millis() as u64, expired = expired.len(), "Deliverable timed out");
                for expired_key in expired {
                    self.tracer
                        .emit(TraceEvent::StoreMutated {
                            key: expired_key,
                            state: RecordState::Undetermined {
                                cause: cause.clone(),
                            },
                        })
                        .await;
                }
                Ok(self.store.get(key)?)
            }
        }
    }
}

#[cfg(test)]
mod supervisor_test;
