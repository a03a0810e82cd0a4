// ABOUTME: Tests for the tracer - fan-out, run stamping, failing sinks.

use std::sync::Arc;

use super::*;

struct FailingSink;

#[async_trait]
impl TraceSink for FailingSink {
    async fn record(&self, _record: &TraceRecord) -> Result<(), anyhow::Error> {
        anyhow::bail!("disk full")
    }
}

#[tokio::test]
async fn test_records_are_stamped_with_run_id() {
    let tracer = Tracer::new();
    let memory = Arc::new(MemoryTrace::new());
    tracer.register_arc(memory.clone()).await;

    tracer
        .emit(TraceEvent::TaskStarted {
            key: "a".into(),
            depth: 0,
        })
        .await;

    let records = memory.records().await;
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].run_id, tracer.run_id());
}

#[tokio::test]
async fn test_failing_sink_does_not_block_others() {
    let tracer = Tracer::new();
    let memory = Arc::new(MemoryTrace::new());
    tracer.register(FailingSink).await;
    tracer.register_arc(memory.clone()).await;

    tracer
        .emit(TraceEvent::Delegated {
            parent: "b".into(),
            child: "b.1".into(),
            depth: 1,
        })
        .await;

    assert_eq!(memory.events().await.len(), 1);
}

#[tokio::test]
async fn test_json_lines_flatten_event() {
    let tracer = Tracer::new();
    let memory = Arc::new(MemoryTrace::new());
    tracer.register_arc(memory.clone()).await;
    tracer
        .emit(TraceEvent::StoreMutated {
            key: "a".into(),
            state: RecordState::Running,
        })
        .await;

    let lines = memory.to_json_lines().await.unwrap();
    let value: serde_json::Value = serde_json::from_str(lines.trim()).unwrap();
    assert_eq!(value["event"], "store_mutated");
    assert_eq!(value["key"], "a");
    assert_eq!(value["run_id"], tracer.run_id().to_string());
}

#[tokio::test]
async fn test_log_trace_accepts_records() {
    let tracer = Tracer::new();
    tracer.register(LogTrace).await;
    tracer
        .emit(TraceEvent::TaskStarted {
            key: "a".into(),
            depth: 0,
        })
        .await;
}
