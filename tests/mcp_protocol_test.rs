//! Protocol integration tests.
//!
//! Exercise the JSON-RPC 2.0 types and the tool router directly, with an
//! in-memory wiki standing in for the MediaWiki API.

use find_link::api::InMemoryWiki;
use find_link::tools::ToolRouter;
use serde_json::json;

fn router(wiki: InMemoryWiki) -> ToolRouter {
    ToolRouter::new(Box::new(wiki))
}

#[test]
fn test_json_rpc_request_parsing() {
    let req_json = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "initialize",
        "params": {
            "protocolVersion": "2025-06-18",
            "capabilities": {},
            "clientInfo": {
                "name": "test-client",
                "version": "0.1.0"
            }
        }
    });

    let req: find_link::server::JsonRpcRequest =
        serde_json::from_value(req_json).expect("should parse initialize request");

    assert_eq!(req.method, "initialize");
    assert_eq!(req.id, Some(json!(1)));
}

#[test]
fn test_json_rpc_response_serialization() {
    let resp = find_link::server::JsonRpcResponse {
        jsonrpc: "2.0".to_owned(),
        id: Some(json!(1)),
        result: Some(json!({"protocolVersion": "2025-06-18"})),
        error: None,
    };

    let json_str = serde_json::to_string(&resp).expect("should serialize");
    assert!(json_str.contains("2025-06-18"));
    assert!(!json_str.contains("error")); // error is None, should be skipped
}

#[test]
fn test_json_rpc_error_response() {
    let resp = find_link::server::JsonRpcResponse {
        jsonrpc: "2.0".to_owned(),
        id: Some(json!(2)),
        result: None,
        error: Some(find_link::server::JsonRpcError {
            code: find_link::server::JsonRpcError::METHOD_NOT_FOUND,
            message: "method not found".to_owned(),
        }),
    };

    let json_str = serde_json::to_string(&resp).expect("should serialize");
    assert!(json_str.contains("-32601"));
    assert!(json_str.contains("method not found"));
    assert!(!json_str.contains("result")); // result is None, should be skipped
}

#[test]
fn test_tool_definitions_complete() {
    let router = router(InMemoryWiki::new());

    let tools = router.list_tools();
    assert_eq!(tools.len(), 5);

    let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
    assert!(names.contains(&"link"));
    assert!(names.contains(&"link_section"));
    assert!(names.contains(&"link_article"));
    assert!(names.contains(&"diff"));
    assert!(names.contains(&"search"));

    for tool in &tools {
        assert_eq!(tool.input_schema["type"], "object");
        let required = tool.input_schema["required"].as_array().expect("required");
        assert!(required.contains(&json!("q")));
    }
}

#[test]
fn test_tool_call_unknown() {
    let router = router(InMemoryWiki::new());

    let result = router
        .call_tool("nonexistent_tool", json!({}))
        .expect("should not error");

    assert!(result.is_error);
    assert!(result.content[0].text.contains("Unknown tool"));
}

#[test]
fn test_tool_call_link() {
    let router = router(InMemoryWiki::new());

    let result = router
        .call_tool(
            "link",
            json!({
                "q": "two-factor authentication",
                "content": "Two factor authentication is a 'strong authentication' method as it"
            }),
        )
        .expect("link should succeed");
    assert!(!result.is_error);

    let value: serde_json::Value = serde_json::from_str(&result.content[0].text).expect("json");
    assert_eq!(value["replacement"], "Two-factor authentication");
    assert_eq!(
        value["content"],
        "[[Two-factor authentication]] is a 'strong authentication' method as it"
    );
}

#[test]
fn test_tool_call_link_with_linkto() {
    let router = router(InMemoryWiki::new());

    let result = router
        .call_tool(
            "link",
            json!({
                "q": "ticket_barriers",
                "content": "Ticket barriers control access to all platforms",
                "linkto": "turnstile"
            }),
        )
        .expect("link should succeed");

    let value: serde_json::Value = serde_json::from_str(&result.content[0].text).expect("json");
    assert_eq!(value["replacement"], "Turnstile|Ticket barriers");
}

#[test]
fn test_tool_call_link_not_found() {
    let router = router(InMemoryWiki::new());

    let result = router
        .call_tool("link", json!({"q": "standing desk", "content": "Office furniture."}))
        .expect("should not error");

    assert!(result.is_error);
    assert_eq!(result.content[0].text, "phrase not found in article");
}

#[test]
fn test_tool_call_link_article() {
    let wiki = InMemoryWiki::new().with_page(
        "Congestion pricing",
        "Examples include the London congestion charge.",
    );
    let router = router(wiki);

    let result = router
        .call_tool(
            "link_article",
            json!({"q": "London congestion charge", "title": "Congestion pricing"}),
        )
        .expect("link_article should succeed");
    assert!(!result.is_error);

    let value: serde_json::Value = serde_json::from_str(&result.content[0].text).expect("json");
    assert_eq!(value["content"], "Examples include the [[London congestion charge]].");
    assert_eq!(value["timestamp"], "20150807153703");
}

#[test]
fn test_tool_call_diff() {
    let wiki = InMemoryWiki::new().with_page(
        "Trigonometry",
        "Lead.\n== History ==\nEarly spherical trig.\n",
    );
    let router = router(wiki);

    let result = router
        .call_tool("diff", json!({"q": "spherical trig", "title": "Trigonometry"}))
        .expect("diff should succeed");
    assert!(!result.is_error);
    assert!(result.content[0].text.contains("[[spherical trig]]"));
}

#[test]
fn test_tool_call_search() {
    let wiki = InMemoryWiki::new()
        .with_page("Congestion charge", "A '''congestion charge''' is a fee.")
        .with_page("Stockholm", "Stockholm has a [[congestion charge]] too.")
        .with_page("Road pricing", "Road pricing includes a congestion charge.")
        .with_page("Oslo", "Oslo has a CONGESTION CHARGE.");
    let router = router(wiki);

    let result = router
        .call_tool("search", json!({"q": "congestion charge"}))
        .expect("search should succeed");
    assert!(!result.is_error);

    let value: serde_json::Value = serde_json::from_str(&result.content[0].text).expect("json");
    assert_eq!(value["totalhits"], 4);
    assert!(value["redirectTo"].is_null());
    assert_eq!(value["results"][0]["title"], "Oslo");
    assert_eq!(value["results"][0]["matchType"], "case_mismatch");
    assert_eq!(value["results"][1]["title"], "Road pricing");
    assert_eq!(value["results"][1]["matchType"], "exact");
    assert_eq!(value["longer"], json!([]));
}

#[test]
fn test_tool_call_bad_arguments() {
    let router = router(InMemoryWiki::new());

    let err = router
        .call_tool("link_section", json!({"content": "no phrase"}))
        .expect_err("missing q");
    assert!(err.to_string().contains("link_section"));
}

#[test]
fn test_tool_result_serialization() {
    let result = find_link::server::ToolCallResult::text("ok");
    let json_str = serde_json::to_string(&result).expect("should serialize");
    assert!(json_str.contains(r#""type":"text""#));
    assert!(!json_str.contains("isError"));

    let result = find_link::server::ToolCallResult::error("bad");
    let json_str = serde_json::to_string(&result).expect("should serialize");
    assert!(json_str.contains(r#""isError":true"#));
}
