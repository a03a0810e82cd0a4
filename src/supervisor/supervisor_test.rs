// ABOUTME: Tests for the supervisor - ordering, fan-out, timeouts, fatal errors.

use std::sync::Arc;
use std::time::Duration;

use super::*;
use crate::deliverable::{DeliverableSpec, FailureReason, RecordState, SpecOverrides, UndeterminedCause};
use crate::engine::{Decision, ScriptedEngine};
use crate::error::{DossierError, StoreError};
use crate::tool::{ArgValue, Arguments, Registry, ToolCall};
use crate::tools::{FactTable, LookupFactTool};
use crate::trace::{MemoryTrace, TraceEvent};
use crate::unit::Quantity;

async fn tools() -> Registry {
    let registry = Registry::new();
    let mut table = FactTable::new();
    for i in 1..=5 {
        table = table.fact("facts", &format!("k{}", i), Quantity::millions(i as f64));
    }
    registry.register(LookupFactTool::new(table)).await;
    registry
}

fn lookup(name: &str) -> Decision {
    Decision::Tool(ToolCall::new(
        "lookup_fact",
        Arguments::new()
            .with("source", ArgValue::Text("facts".into()))
            .with("name", ArgValue::Text(name.into())),
    ))
}

fn spec(key: &str) -> DeliverableSpec {
    DeliverableSpec::new(key, format!("Value of {}", key))
}

#[tokio::test]
async fn test_records_follow_planner_order_not_completion_order() {
    let engine = ScriptedEngine::new()
        .script("k1", vec![lookup("k1"), Decision::store_ref(0)])
        .script("k2", vec![lookup("k2"), Decision::store_ref(0)])
        .latency("k1", Duration::from_millis(30));
    let supervisor = Supervisor::new(Arc::new(engine), tools().await, EngineConfig::default());

    let summary = supervisor.run(&[spec("k1"), spec("k2")]).await.unwrap();
    let order: Vec<_> = summary.records().map(|r| r.key.as_str()).collect();
    assert_eq!(order, vec!["k1", "k2"]);
    assert_eq!(summary.get("k1").unwrap().value(), Some(&Quantity::millions(1.0)));
}

#[tokio::test]
async fn test_five_concurrent_tasks_all_resolve() {
    let mut engine = ScriptedEngine::new();
    for i in 1..=5 {
        let key = format!("k{}", i);
        engine = engine
            .script(&key, vec![lookup(&key), Decision::store_ref(0)])
            .latency(&key, Duration::from_millis(10 * (6 - i)));
    }
    let supervisor = Supervisor::new(
        Arc::new(engine),
        tools().await,
        EngineConfig::default().with_fan_out(5),
    );
    let specs: Vec<_> = (1..=5).map(|i| spec(&format!("k{}", i))).collect();

    let summary = supervisor.run(&specs).await.unwrap();
    for i in 1..=5 {
        let record = summary.get(&format!("k{}", i)).unwrap();
        assert_eq!(record.value(), Some(&Quantity::millions(i as f64)));
    }
    assert_eq!(summary.store().len(), 5);
}

#[tokio::test]
async fn test_fan_out_of_one_runs_in_order() {
    let engine = ScriptedEngine::new()
        .script("k1", vec![lookup("k1"), Decision::store_ref(0)])
        .script("k2", vec![lookup("k2"), Decision::store_ref(0)])
        .script("k3", vec![lookup("k3"), Decision::store_ref(0)]);
    let supervisor = Supervisor::new(
        Arc::new(engine),
        tools().await,
        EngineConfig::default().with_fan_out(1),
    );
    let trace = Arc::new(MemoryTrace::new());
    supervisor.tracer().register_arc(trace.clone()).await;

    supervisor
        .run(&[spec("k1"), spec("k2"), spec("k3")])
        .await
        .unwrap();

    let started: Vec<_> = trace
        .events()
        .await
        .into_iter()
        .filter_map(|e| match e {
            TraceEvent::TaskStarted { key, .. } => Some(key),
            _ => None,
        })
        .collect();
    assert_eq!(started, vec!["k1", "k2", "k3"]);
}

#[tokio::test]
async fn test_duplicate_keys_abort_the_run() {
    let supervisor = Supervisor::new(
        Arc::new(ScriptedEngine::new()),
        tools().await,
        EngineConfig::default(),
    );

    match supervisor.run(&[spec("k1"), spec("k1")]).await {
        Err(DossierError::Store(StoreError::DuplicateKey(key))) => assert_eq!(key, "k1"),
        Err(other) => panic!("Expected DuplicateKey, got {:?}", other),
        Ok(_) => panic!("Expected DuplicateKey, got a summary"),
    }
}

#[tokio::test]
async fn test_invalid_config_is_rejected() {
    let supervisor = Supervisor::new(
        Arc::new(ScriptedEngine::new()),
        tools().await,
        EngineConfig::default().with_fan_out(0),
    );
    assert!(matches!(
        supervisor.run(&[spec("k1")]).await,
        Err(DossierError::Config(_))
    ));
}

#[tokio::test]
async fn test_timeout_expires_whole_subtree() {
    let engine = ScriptedEngine::new()
        .script("slow", vec![Decision::Delegate(SpecOverrides::new("sub"))])
        .latency("slow.1", Duration::from_secs(5))
        .script("k1", vec![lookup("k1"), Decision::store_ref(0)]);
    let supervisor = Supervisor::new(
        Arc::new(engine),
        tools().await,
        EngineConfig::default().with_task_timeout(Duration::from_millis(50)),
    );

    let summary = supervisor.run(&[spec("slow"), spec("k1")]).await.unwrap();
    let expected = RecordState::Undetermined {
        cause: UndeterminedCause::Timeout { after_ms: 50 },
    };
    assert_eq!(summary.get("slow").unwrap().state, expected);
    assert_eq!(summary.store().get("slow.1").unwrap().state, expected);
    assert_eq!(summary.get("k1").unwrap().value(), Some(&Quantity::millions(1.0)));
}

#[tokio::test]
async fn test_top_level_spec_at_ceiling_fails_without_attempt() {
    let engine = Arc::new(ScriptedEngine::new());
    let supervisor = Supervisor::new(
        engine.clone(),
        tools().await,
        EngineConfig::default().with_max_depth(0),
    );

    let summary = supervisor.run(&[spec("k1")]).await.unwrap();
    assert_eq!(
        summary.get("k1").unwrap().failure(),
        Some(&FailureReason::DepthExceeded {
            depth: 0,
            max_depth: 0
        })
    );
    assert_eq!(engine.calls("k1").await, 0);
}

#[tokio::test]
async fn test_empty_run() {
    let supervisor = Supervisor::new(
        Arc::new(ScriptedEngine::new()),
        tools().await,
        EngineConfig::default(),
    );
    let summary = supervisor.run(&[]).await.unwrap();
    assert!(summary.keys().is_empty());
    assert!(summary.report().is_empty());
}

#[tokio::test]
async fn test_trace_records_share_run_id() {
    let engine = ScriptedEngine::new().script("k1", vec![lookup("k1"), Decision::store_ref(0)]);
    let supervisor = Supervisor::new(Arc::new(engine), tools().await, EngineConfig::default());
    let trace = Arc::new(MemoryTrace::new());
    supervisor.tracer().register_arc(trace.clone()).await;

    let summary = supervisor.run(&[spec("k1")]).await.unwrap();
    let records = trace.records().await;
    assert!(!records.is_empty());
    assert!(records.iter().all(|r| r.run_id == summary.run_id));
}
