// ABOUTME: Tests for researcher working state - references, chaining, child keys.

use super::*;
use crate::deliverable::{DeliverableSpec, RecordState};
use crate::error::ToolError;
use crate::tool::{ArgValue, Arguments, Provenance, ToolCall, ToolResult, ToolValue};
use crate::unit::{Quantity, Unit};

fn tool_entry(step: usize, value: Quantity) -> LogEntry {
    LogEntry::Tool {
        step,
        call: ToolCall::new("lookup_fact", Arguments::new()),
        outcome: Ok(ToolResult {
            value: ToolValue::Quantity(value),
            provenance: Provenance {
                task: "a".into(),
                step,
                tool: "lookup_fact".into(),
            },
        }),
    }
}

fn state_with_log() -> ResearcherState {
    let mut state = ResearcherState::new(DeliverableSpec::new("a", "A"));
    state.begin_step();
    state.push(tool_entry(0, Quantity::millions(5.0)));
    state.begin_step();
    state.push(LogEntry::Note {
        step: 1,
        text: "thinking".into(),
    });
    state.begin_step();
    state.push(LogEntry::Delegated {
        step: 2,
        child: "a.1".into(),
        state: RecordState::Resolved {
            value: Quantity::millions(7.5),
        },
    });
    state
}

#[test]
fn test_refs_resolve_inside_lists() {
    let state = state_with_log();
    let mut args = Arguments::new().with(
        "values",
        ArgValue::List(vec![ArgValue::Ref(0), ArgValue::Ref(2)]),
    );

    state.resolve_refs(&mut args).unwrap();
    assert_eq!(
        args.quantity_list("values").unwrap(),
        vec![&Quantity::millions(5.0), &Quantity::millions(7.5)]
    );
}

#[test]
fn test_ref_to_step_without_value() {
    let state = state_with_log();
    assert!(matches!(state.lookup(1), Err(ToolError::InvalidParams(_))));
    assert!(matches!(state.lookup(9), Err(ToolError::InvalidParams(_))));
}

#[test]
fn test_traceability_exempts_dimensionless_literals() {
    let state = state_with_log();
    let args = Arguments::new()
        .with("initial", ArgValue::Quantity(Quantity::millions(7.5)))
        .with("rate", ArgValue::Quantity(Quantity::scalar(0.1)))
        .with("growth", ArgValue::Quantity(Quantity::new(20.0, Unit::Percent)));
    assert!(state.check_traceable(&args).is_ok());
}

#[test]
fn test_rescaled_literal_is_untraced() {
    let state = state_with_log();
    let args = Arguments::new().with(
        "initial",
        ArgValue::Quantity(Quantity::new(5_000_000.0, Unit::Absolute)),
    );
    match state.check_traceable(&args) {
        Err(ToolError::UntracedValue(value)) => assert!(value.contains("absolute")),
        other => panic!("Expected UntracedValue, got {:?}", other),
    }
}

#[test]
fn test_child_keys_count_from_one() {
    let mut state = ResearcherState::new(DeliverableSpec::new("b", "B"));
    assert_eq!(state.next_child_key(), "b.1");
    assert_eq!(state.next_child_key(), "b.2");
}

#[test]
fn test_describe_mentions_outcome() {
    let state = state_with_log();
    let lines: Vec<_> = state.log().iter().map(LogEntry::describe).collect();
    assert!(lines[0].contains("5 millions"));
    assert!(lines[2].contains("a.1"));
}
