// ABOUTME: Tests for report rendering - ordering, sentinel, formats, tolerance.

use super::*;
use crate::deliverable::{FailureReason, UndeterminedCause};
use crate::store::DeliverableStore;
use crate::unit::{Quantity, Unit};

fn keys(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

fn populated_store() -> DeliverableStore {
    let store = DeliverableStore::new();
    for key in ["a", "b", "c", "d"] {
        store.register(key).unwrap();
    }
    store.set_resolved("a", Quantity::millions(108.03)).unwrap();
    store
        .set_failed(
            "b",
            FailureReason::DepthExceeded {
                depth: 2,
                max_depth: 2,
            },
        )
        .unwrap();
    store.start("c").unwrap();
    store
        .set_undetermined("c", UndeterminedCause::StepBudgetExhausted { steps: 3 })
        .unwrap();
    store
}

#[test]
fn test_render_follows_given_order() {
    let report = render(&keys(&["d", "c", "b", "a"]), &populated_store());
    let order: Vec<_> = report.lines.iter().map(|l| l.key.as_str()).collect();
    assert_eq!(order, vec!["d", "c", "b", "a"]);
}

#[test]
fn test_sentinel_distinguishes_attempted() {
    let report = render(&keys(&["a", "b", "c", "d", "missing"]), &populated_store());

    assert!(report.get("c").unwrap().was_attempted());
    assert!(!report.get("d").unwrap().was_attempted());
    assert!(!report.get("missing").unwrap().was_attempted());
    assert!(report.value("c").is_none());
}

#[test]
fn test_json_shape() {
    let report = render(&keys(&["a", "b", "c", "d"]), &populated_store());
    let json = report.to_json();

    assert_eq!(json["deliverables"]["a"]["value"], 108.03);
    assert_eq!(json["deliverables"]["a"]["unit"], "millions");
    assert_eq!(json["deliverables"]["b"]["failed"], "depth_exceeded");
    assert_eq!(json["deliverables"]["c"], "To be determined");
    assert_eq!(json["deliverables"]["d"], "To be determined");
}

#[test]
fn test_markdown_lines() {
    let report = render(&keys(&["a", "b", "c"]), &populated_store());
    let markdown = report.to_markdown();

    assert!(markdown.contains("- **a**: 108.03 millions"));
    assert!(markdown.contains("- **b**: Failed: depth_exceeded"));
    assert!(markdown.contains("- **c**: To be determined"));
}

#[test]
fn test_empty_report() {
    let report = render(&[], &DeliverableStore::new());
    assert!(report.is_empty());
    assert_eq!(report.to_json(), serde_json::json!({"deliverables": {}}));
    assert_eq!(report.to_markdown(), "_No deliverables._\n");
}

#[test]
fn test_matches_with_tolerance() {
    let report = render(&keys(&["a", "c"]), &populated_store());

    assert!(report.matches("a", &Quantity::millions(108.0), 0.01));
    assert!(!report.matches("a", &Quantity::millions(100.0), 0.01));
    assert!(!report.matches("a", &Quantity::new(108.03, Unit::Billions), 0.01));
    assert!(!report.matches("c", &Quantity::millions(0.0), 1.0));
}
