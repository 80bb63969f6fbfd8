//! Tool server: JSON-RPC 2.0 over stdio, one message per line.
//!
//! The client calls `initialize`, lists the linking tools with
//! `tools/list` and runs them with `tools/call`. Requests without an `id`
//! are notifications and get no reply. The server exits when stdin closes.

use std::io::{BufRead, Read, Write};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, error, info, warn};

use crate::api::{ApiContext, USER_AGENT, Wiki};
use crate::tools::ToolRouter;

/// Largest accepted request line. Whole articles travel in `content`
/// arguments.
const MAX_LINE_BYTES: usize = 10 * 1024 * 1024;

const PROTOCOL_VERSION: &str = "2025-06-18";

/// Sent to the client with `initialize`.
const INSTRUCTIONS: &str = "Links a phrase in Wikipedia articles. \
    `search` lists articles that mention the phrase without linking to it. \
    `link_article` fetches one of them and returns the linked wikitext with an edit summary. \
    `link` and `link_section` work on wikitext you supply. \
    `diff` shows the changed section for review before saving. \
    Arguments may use underscores for spaces.";

/// A JSON-RPC request or notification.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

/// A JSON-RPC reply: exactly one of `result` and `error` is set.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

impl JsonRpcError {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;

    fn new(code: i64, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl JsonRpcResponse {
    /// Reply with `result`, or an internal error if it doesn't serialize.
    pub fn success(id: Option<Value>, result: &impl Serialize) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => Self::reply(id, Ok(value)),
            Err(e) => {
                error!(error = %e, "failed to serialize result");
                Self::failure(id, JsonRpcError::INTERNAL_ERROR, format!("internal error: {e}"))
            }
        }
    }

    pub fn failure(id: Option<Value>, code: i64, message: impl Into<String>) -> Self {
        Self::reply(id, Err(JsonRpcError::new(code, message)))
    }

    fn reply(id: Option<Value>, outcome: Result<Value, JsonRpcError>) -> Self {
        let (result, error) = match outcome {
            Ok(value) => (Some(value), None),
            Err(e) => (None, Some(e)),
        };
        Self {
            jsonrpc: "2.0".to_owned(),
            id,
            result,
            error,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InitializeResult {
    protocol_version: &'static str,
    capabilities: Value,
    server_info: ServerInfo,
    instructions: &'static str,
}

#[derive(Debug, Serialize)]
struct ServerInfo {
    name: &'static str,
    title: &'static str,
    version: &'static str,
}

/// One entry of `tools/list`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

#[derive(Debug, Serialize)]
struct ToolsList {
    tools: Vec<ToolDefinition>,
}

#[derive(Debug, Deserialize)]
struct ToolCallParams {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Serialize)]
pub struct ContentItem {
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

/// Result of `tools/call`. Tool-level failures (no match, missing
/// article) are results with `is_error` set, not JSON-RPC errors.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub content: Vec<ContentItem>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolCallResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentItem {
                content_type: "text".to_owned(),
                text: text.into(),
            }],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(text)
        }
    }
}

/// Which wiki the server talks to.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Wikipedia language edition, e.g. `en`.
    pub language: String,
    pub user_agent: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            language: "en".to_owned(),
            user_agent: USER_AGENT.to_owned(),
        }
    }
}

impl ServerConfig {
    fn api_context(&self) -> ApiContext {
        ApiContext {
            language: self.language.clone(),
            user_agent: self.user_agent.clone(),
        }
    }
}

#[cfg(feature = "http")]
fn connect(config: &ServerConfig) -> Result<Box<dyn Wiki>> {
    let client = crate::api::MediaWikiClient::new(&config.api_context())
        .context("failed to build MediaWiki client")?;
    Ok(Box::new(client))
}

#[cfg(not(feature = "http"))]
fn connect(config: &ServerConfig) -> Result<Box<dyn Wiki>> {
    warn!(
        url = config.api_context().query_url(),
        "built without the http feature, article lookups will find nothing"
    );
    Ok(Box::new(crate::api::InMemoryWiki::new()))
}

/// Serve requests from stdin until it closes.
///
/// # Errors
///
/// Returns an error if stdin can't be read or stdout can't be written.
pub fn run_server(config: &ServerConfig) -> Result<()> {
    info!(language = config.language, "find-link server starting");

    let router = ToolRouter::new(connect(config)?);
    let mut reader = std::io::stdin().lock();
    let mut stdout = std::io::stdout().lock();
    let mut line = String::new();

    loop {
        line.clear();
        match read_line_limited(&mut reader, &mut line, MAX_LINE_BYTES) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) if e.is::<std::io::Error>() => return Err(e.context("failed to read stdin")),
            Err(e) => {
                warn!(error = %e, "dropped request line");
                let reply = JsonRpcResponse::failure(None, JsonRpcError::PARSE_ERROR, e.to_string());
                write_response(&mut stdout, &reply)?;
                continue;
            }
        }
        if let Some(reply) = handle_line(&router, &line) {
            write_response(&mut stdout, &reply)?;
        }
    }

    info!("stdin closed, find-link server stopped");
    Ok(())
}

/// Handle one request line. `None` for blank lines and notifications.
fn handle_line(router: &ToolRouter, line: &str) -> Option<JsonRpcResponse> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    debug!(raw = line, "received request");

    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "invalid JSON-RPC request");
            return Some(JsonRpcResponse::failure(
                None,
                JsonRpcError::PARSE_ERROR,
                format!("parse error: {e}"),
            ));
        }
    };
    if request.jsonrpc != "2.0" {
        warn!(version = request.jsonrpc, "unsupported JSON-RPC version");
        return Some(JsonRpcResponse::failure(
            request.id,
            JsonRpcError::INVALID_REQUEST,
            format!("jsonrpc must be \"2.0\", got \"{}\"", request.jsonrpc),
        ));
    }

    let response = dispatch(router, &request);
    if request.id.is_none() {
        debug!(method = request.method, "notification handled");
        return None;
    }
    response
}

fn dispatch(router: &ToolRouter, req: &JsonRpcRequest) -> Option<JsonRpcResponse> {
    let id = req.id.clone();
    let response = match req.method.as_str() {
        "initialize" => JsonRpcResponse::success(id, &initialize_result()),
        "notifications/initialized" => {
            info!("client initialized");
            return None;
        }
        "tools/list" => JsonRpcResponse::success(
            id,
            &ToolsList {
                tools: router.list_tools(),
            },
        ),
        "tools/call" => call_tool(router, id, &req.params),
        "ping" => JsonRpcResponse::success(id, &json!({})),
        method => {
            warn!(method, "unknown method");
            JsonRpcResponse::failure(
                id,
                JsonRpcError::METHOD_NOT_FOUND,
                format!("method not found: {method}"),
            )
        }
    };
    Some(response)
}

fn initialize_result() -> InitializeResult {
    InitializeResult {
        protocol_version: PROTOCOL_VERSION,
        capabilities: json!({ "tools": { "listChanged": false } }),
        server_info: ServerInfo {
            name: "find-link",
            title: "Find link",
            version: env!("CARGO_PKG_VERSION"),
        },
        instructions: INSTRUCTIONS,
    }
}

fn call_tool(router: &ToolRouter, id: Option<Value>, params: &Value) -> JsonRpcResponse {
    let params = match ToolCallParams::deserialize(params) {
        Ok(params) => params,
        Err(e) => {
            return JsonRpcResponse::failure(
                id,
                JsonRpcError::INVALID_PARAMS,
                format!("invalid tools/call params: {e}"),
            );
        }
    };
    let result = router
        .call_tool(&params.name, params.arguments)
        .unwrap_or_else(|e| {
            error!(tool = params.name, error = %e, "tool call failed");
            ToolCallResult::error(format!("Error: {e:#}"))
        });
    JsonRpcResponse::success(id, &result)
}

fn write_response(out: &mut impl Write, resp: &JsonRpcResponse) -> Result<()> {
    let json = serde_json::to_string(resp).context("failed to serialize response")?;
    debug!(response = json, "sending response");
    writeln!(out, "{json}").context("failed to write to stdout")?;
    out.flush().context("failed to flush stdout")
}

/// Read one line, newline included, into `buf`. Returns the bytes read,
/// 0 at end of input.
///
/// A line longer than `max_bytes` is skipped through its newline and
/// reported as an error, leaving the reader at the next line.
fn read_line_limited(reader: &mut impl BufRead, buf: &mut String, max_bytes: usize) -> Result<usize> {
    let mut bytes = Vec::new();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX).saturating_add(1);
    let read = reader.by_ref().take(limit).read_until(b'\n', &mut bytes)?;
    if read > max_bytes {
        if bytes.last() != Some(&b'\n') {
            reader.skip_until(b'\n')?;
        }
        anyhow::bail!("line exceeds maximum size ({max_bytes} bytes)");
    }
    buf.push_str(std::str::from_utf8(&bytes).context("non-UTF-8 data on stdin")?);
    Ok(read)
}
