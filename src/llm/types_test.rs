// ABOUTME: Tests for LLM types - serialization and response helpers.
// ABOUTME: Covers the shapes the reasoning engine depends on.

use super::*;

#[test]
fn test_role_serialization() {
    assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
    assert_eq!(serde_json::to_string(&Role::Assistant).unwrap(), "\"assistant\"");
}

#[test]
fn test_content_block_tool_use_deserialization() {
    let json = r#"{"type":"tool_use","id":"call_1","name":"arithmetic","input":{"operation":"add"}}"#;
    let block: ContentBlock = serde_json::from_str(json).unwrap();
    match block {
        ContentBlock::ToolUse { id, name, input } => {
            assert_eq!(id, "call_1");
            assert_eq!(name, "arithmetic");
            assert_eq!(input["operation"], "add");
        }
        other => panic!("Expected ToolUse, got {:?}", other),
    }
}

#[test]
fn test_request_builder() {
    let req = Request::new("gpt-4o-mini")
        .system("You research one deliverable.")
        .message(Message::user("Resolve A"))
        .max_tokens(512)
        .temperature(0.0);

    assert_eq!(req.model, "gpt-4o-mini");
    assert_eq!(req.messages.len(), 1);
    assert_eq!(req.max_tokens, Some(512));
    assert_eq!(req.system.as_deref(), Some("You research one deliverable."));
}

#[test]
fn test_response_first_tool_use_skips_text() {
    let response = Response {
        id: "r1".into(),
        content: vec![
            ContentBlock::text("Let me compute that."),
            ContentBlock::ToolUse {
                id: "c1".into(),
                name: "arithmetic".into(),
                input: serde_json::json!({}),
            },
            ContentBlock::ToolUse {
                id: "c2".into(),
                name: "lookup_fact".into(),
                input: serde_json::json!({}),
            },
        ],
        stop_reason: StopReason::ToolUse,
        model: "m".into(),
        usage: Usage::default(),
    };

    let (name, _) = response.first_tool_use().unwrap();
    assert_eq!(name, "arithmetic");
    assert_eq!(response.text(), "Let me compute that.");
}

#[test]
fn test_response_without_tool_use() {
    let response = Response {
        id: "r1".into(),
        content: vec![ContentBlock::text("done")],
        stop_reason: StopReason::EndTurn,
        model: "m".into(),
        usage: Usage::default(),
    };
    assert!(response.first_tool_use().is_none());
}
