//! Tool server session lifecycle: state machine preconditions, idempotent
//! connect/close, clean teardown on probe failure and scoped acquisition.

mod support;

use agent_tools_rust::session::{
    InvocationContent, ResourceContent, SessionState, ToolServerSession,
};
use agent_tools_rust::Error;
use serde_json::json;
use std::sync::atomic::Ordering;
use support::ScriptedConnector;

fn session_with(connector: ScriptedConnector) -> ToolServerSession {
    ToolServerSession::with_connector("http://tools.test/mcp", Box::new(connector))
}

#[tokio::test]
async fn test_operations_require_connected_state() {
    let mut session = session_with(ScriptedConnector::new());
    assert_eq!(session.state(), SessionState::Disconnected);

    assert!(matches!(
        session.list_tools().await.unwrap_err(),
        Error::NotConnected
    ));
    assert!(matches!(
        session.invoke_tool("execute", json!({})).await.unwrap_err(),
        Error::NotConnected
    ));
    assert!(matches!(
        session.read_resource("res://x").await.unwrap_err(),
        Error::NotConnected
    ));
}

#[tokio::test]
async fn test_connect_performs_handshake_and_probe() {
    let connector = ScriptedConnector::new();
    let log = connector.log();
    let mut session = session_with(connector);

    session.connect().await.unwrap();

    assert_eq!(session.state(), SessionState::Connected);
    assert_eq!(log.method_count("initialize"), 1);
    assert_eq!(log.method_count("notifications/initialized"), 1);
    assert_eq!(log.method_count("ping"), 1);
}

#[tokio::test]
async fn test_connect_twice_is_a_noop() {
    let connector = ScriptedConnector::new();
    let log = connector.log();
    let mut session = session_with(connector);

    session.connect().await.unwrap();
    session.connect().await.unwrap();

    // No duplicate handshake on the second call.
    assert_eq!(log.method_count("initialize"), 1);
    assert_eq!(log.method_count("ping"), 1);
}

#[tokio::test]
async fn test_probe_failure_tears_down_cleanly() {
    let connector = ScriptedConnector::new().fail("ping");
    let log = connector.log();
    let mut session = session_with(connector);

    let err = session.connect().await.unwrap_err();

    assert!(matches!(err, Error::Connection(_)));
    // Not left half-open: both layers released, session retryable.
    assert_eq!(log.end_session_calls.load(Ordering::SeqCst), 1);
    assert_eq!(log.close_calls.load(Ordering::SeqCst), 1);
    assert_eq!(session.state(), SessionState::Disconnected);
    assert!(matches!(
        session.list_tools().await.unwrap_err(),
        Error::NotConnected
    ));
}

#[tokio::test]
async fn test_handshake_failure_is_a_connection_error() {
    let mut session = session_with(ScriptedConnector::new().fail("initialize"));
    let err = session.connect().await.unwrap_err();
    assert!(matches!(err, Error::Connection(_)));
    assert_eq!(session.state(), SessionState::Disconnected);
}

#[tokio::test]
async fn test_close_is_idempotent_and_never_fails() {
    let connector = ScriptedConnector::new();
    let log = connector.log();
    let mut session = session_with(connector);
    session.connect().await.unwrap();

    session.close().await;
    session.close().await;

    assert_eq!(session.state(), SessionState::Closed);
    // Handles cleared on the first close; the second releases nothing.
    assert_eq!(log.end_session_calls.load(Ordering::SeqCst), 1);
    assert_eq!(log.close_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_close_swallows_teardown_failures() {
    let connector = ScriptedConnector::new().fail_teardown();
    let log = connector.log();
    let mut session = session_with(connector);
    session.connect().await.unwrap();

    session.close().await;

    // Both release steps ran even though each failed.
    assert_eq!(log.end_session_calls.load(Ordering::SeqCst), 1);
    assert_eq!(log.close_calls.load(Ordering::SeqCst), 1);
    assert_eq!(session.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_closed_session_is_terminal() {
    let mut session = session_with(ScriptedConnector::new());
    session.connect().await.unwrap();
    session.close().await;

    assert!(matches!(
        session.list_tools().await.unwrap_err(),
        Error::NotConnected
    ));
    assert!(matches!(
        session.connect().await.unwrap_err(),
        Error::Connection(_)
    ));
}

#[tokio::test]
async fn test_scope_closes_on_success_and_on_error() {
    let connector = ScriptedConnector::new();
    let mut session = session_with(connector);
    let value = session
        .scope(|s| {
            Box::pin(async move {
                assert_eq!(s.state(), SessionState::Connected);
                Ok(42)
            })
        })
        .await
        .unwrap();
    assert_eq!(value, 42);
    assert_eq!(session.state(), SessionState::Closed);

    let mut session = session_with(ScriptedConnector::new());
    let err = session
        .scope(|_| Box::pin(async { Err::<(), _>(Error::content("boom")) }))
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Content(_)));
    assert_eq!(session.state(), SessionState::Closed);
}

#[tokio::test]
async fn test_list_tools_decodes_descriptors() {
    let connector = ScriptedConnector::new().respond(
        "tools/list",
        json!({
            "tools": [{
                "name": "execute",
                "description": "Run python code",
                "inputSchema": {"type": "object", "properties": {"code": {"type": "string"}}}
            }]
        }),
    );
    let mut session = session_with(connector);
    session.connect().await.unwrap();

    let tools = session.list_tools().await.unwrap();
    assert_eq!(tools.len(), 1);
    assert_eq!(tools[0].name, "execute");
    assert_eq!(tools[0].input_schema["type"], "object");
}

#[tokio::test]
async fn test_invoke_tool_normalizes_first_content_item() {
    let connector = ScriptedConnector::new().respond(
        "tools/call",
        json!({"content": [{"type": "text", "text": "done"}, {"type": "text", "text": "ignored"}]}),
    );
    let mut session = session_with(connector);
    session.connect().await.unwrap();

    let content = session.invoke_tool("execute", json!({})).await.unwrap();
    assert_eq!(content, Some(InvocationContent::Text("done".into())));
}

#[tokio::test]
async fn test_invoke_tool_keeps_unknown_content_opaque() {
    let item = json!({"type": "image", "data": "iVBOR", "mimeType": "image/png"});
    let connector =
        ScriptedConnector::new().respond("tools/call", json!({ "content": [item.clone()] }));
    let mut session = session_with(connector);
    session.connect().await.unwrap();

    let content = session.invoke_tool("render", json!({})).await.unwrap();
    assert_eq!(content, Some(InvocationContent::Other(item)));
}

#[tokio::test]
async fn test_read_resource_text_blob_and_empty() {
    use base64::Engine as _;
    let blob = base64::engine::general_purpose::STANDARD.encode(b"\x89PNG");
    let connector = ScriptedConnector::new()
        .respond("resources/read", json!({"contents": [{"text": "hello"}]}));
    let mut session = session_with(connector);
    session.connect().await.unwrap();
    assert_eq!(
        session.read_resource("res://a").await.unwrap(),
        ResourceContent::Text("hello".into())
    );
    session.close().await;

    let connector = ScriptedConnector::new()
        .respond("resources/read", json!({"contents": [{"blob": blob}]}));
    let mut session = session_with(connector);
    session.connect().await.unwrap();
    assert_eq!(
        session.read_resource("res://b").await.unwrap(),
        ResourceContent::Binary(b"\x89PNG".to_vec())
    );
    session.close().await;

    let connector = ScriptedConnector::new().respond("resources/read", json!({"contents": []}));
    let mut session = session_with(connector);
    session.connect().await.unwrap();
    assert!(matches!(
        session.read_resource("res://c").await.unwrap_err(),
        Error::Content(_)
    ));
}
