// ABOUTME: Tests for the chat completions wire format.
// ABOUTME: Encodes requests and decodes canned responses without a server.

use super::*;
use crate::error::LlmError;

#[test]
fn test_encode_request_puts_system_first() {
    let req = Request::new("gpt-4o-mini")
        .system("sys")
        .message(Message::user("hello"))
        .tools(vec![ToolDefinition {
            name: "arithmetic".into(),
            description: "math".into(),
            input_schema: serde_json::json!({"type": "object"}),
        }]);

    let body = encode_request(&req).unwrap();
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][1]["content"], "hello");
    assert_eq!(body["tools"][0]["type"], "function");
    assert_eq!(body["tools"][0]["function"]["name"], "arithmetic");
    assert!(body.get("max_tokens").is_none());
}

#[test]
fn test_decode_tool_call_response() {
    let body = r#"{
        "id": "chatcmpl-1",
        "model": "gpt-4o-mini",
        "choices": [{
            "message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": "call_1",
                    "type": "function",
                    "function": {"name": "store_deliverable", "arguments": "{\"value\":{\"ref\":1}}"}
                }]
            },
            "finish_reason": "tool_calls"
        }],
        "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15}
    }"#;

    let response = decode_response(body).unwrap();
    assert_eq!(response.stop_reason, StopReason::ToolUse);
    assert_eq!(response.usage.input_tokens, 10);
    let (name, input) = response.first_tool_use().unwrap();
    assert_eq!(name, "store_deliverable");
    assert_eq!(input["value"]["ref"], 1);
}

#[test]
fn test_decode_malformed_arguments_is_an_error() {
    let body = r#"{
        "choices": [{
            "message": {
                "role": "assistant",
                "tool_calls": [{"id": "c", "function": {"name": "x", "arguments": "{not json"}}]
            },
            "finish_reason": "tool_calls"
        }]
    }"#;
    assert!(matches!(decode_response(body), Err(LlmError::Deserialize(_))));
}

#[test]
fn test_decode_empty_choices() {
    let body = r#"{"id": "x", "model": "m", "choices": []}"#;
    assert!(matches!(decode_response(body), Err(LlmError::Configuration(_))));
}

#[test]
fn test_base_url_trailing_slash() {
    let client = OpenAIClient::new("key").with_base_url("http://localhost:8080/v1/");
    assert_eq!(client.endpoint(), "http://localhost:8080/v1/chat/completions");
}
