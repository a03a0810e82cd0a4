// ABOUTME: Structured trace of a resolution run - events, sinks, and the tracer.
// ABOUTME: The engine emits; external sinks persist or inspect.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use uuid::Uuid;

use crate::deliverable::RecordState;
use crate::tool::{Arguments, ToolValue};

/// Something that happened during a run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum TraceEvent {
    /// A spec was registered by the supervisor or by a delegating task.
    SpecCreated {
        key: String,
        depth: usize,
        parent: Option<String>,
    },

    TaskStarted {
        key: String,
        depth: usize,
    },

    /// One step of a researcher's loop, named by the kind of decision taken.
    StepTaken {
        key: String,
        step: usize,
        kind: String,
    },

    ToolInvoked {
        key: String,
        step: usize,
        tool: String,
        arguments: Arguments,
        /// `Err` carries the rendered tool error.
        outcome: Result<ToolValue, String>,
    },

    Delegated {
        parent: String,
        child: String,
        depth: usize,
    },

    /// A record in the store changed state.
    StoreMutated {
        key: String,
        state: RecordState,
    },

    TaskFinished {
        key: String,
        steps: usize,
        state: RecordState,
    },
}

/// An event stamped with the run that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceRecord {
    pub run_id: Uuid,
    #[serde(flatten)]
    pub event: TraceEvent,
}

/// Receives trace records.
///
/// Sink failures are logged and never interrupt a run.
#[async_trait]
pub trait TraceSink: Send + Sync {
    async fn record(&self, record: &TraceRecord) -> Result<(), anyhow::Error>;
}

/// Fans trace records out to every registered sink.
#[derive(Clone)]
pub struct Tracer {
    run_id: Uuid,
    sinks: Arc<RwLock<Vec<Arc<dyn TraceSink>>>>,
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracer {
    /// Create a tracer for a fresh run.
    pub fn new() -> Self {
        Self::with_run_id(Uuid::new_v4())
    }

    pub fn with_run_id(run_id: Uuid) -> Self {
        Self {
            run_id,
            sinks: Arc::new(RwLock::new(Vec::new())),
        }
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub async fn register(&self, sink: impl TraceSink + 'static) {
        self.sinks.write().await.push(Arc::new(sink));
    }

    pub async fn register_arc(&self, sink: Arc<dyn TraceSink>) {
        self.sinks.write().await.push(sink);
    }

    pub async fn emit(&self, event: TraceEvent) {
        let sinks = self.sinks.read().await;
        if sinks.is_empty() {
            return;
        }
        let record = TraceRecord {
            run_id: self.run_id,
            event,
        };
        for sink in sinks.iter() {
            if let Err(e) = sink.record(&record).await {
                warn!(run_id = %self.run_id, error = %e, "Trace sink failed");
            }
        }
    }
}

/// Keeps every record in memory.
#[derive(Default)]
pub struct MemoryTrace {
    records: Mutex<Vec<TraceRecord>>,
}

impl MemoryTrace {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn records(&self) -> Vec<TraceRecord> {
        self.records.lock().await.clone()
    }

    /// Events only, in emission order.
    pub async fn events(&self) -> Vec<TraceEvent> {
        self.records
            .lock()
            .await
            .iter()
            .map(|r| r.event.clone())
            .collect()
    }

    /// Serialize the trace as JSON lines.
    pub async fn to_json_lines(&self) -> Result<String, serde_json::Error> {
        let records = self.records.lock().await;
        let mut out = String::new();
        for record in records.iter() {
            out.push_str(&serde_json::to_string(record)?);
            out.push('\n');
        }
        Ok(out)
    }
}

#[async_trait]
impl TraceSink for MemoryTrace {
    async fn record(&self, record: &TraceRecord) -> Result<(), anyhow::Error> {
        self.records.lock().await.push(record.clone());
        Ok(())
    }
}

/// Forwards every record to `tracing` at info level.
pub struct LogTrace;

#[async_trait]
impl TraceSink for LogTrace {
    async fn record(&self, record: &TraceRecord) -> Result<(), anyhow::Error> {
        let event = serde_json::to_string(&record.event)?;
        info!(run_id = %record.run_id, %event, "trace");
        Ok(())
    }
}

#[cfg(test)]
mod trace_test;
