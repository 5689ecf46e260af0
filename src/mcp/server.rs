//! MCP server implementation that handles JSON-RPC communication
//!
//! This module implements the server that:
//! 1. Reads newline-delimited JSON-RPC requests from stdin
//! 2. Forwards tool listing and tool calls to the backend, one task per request
//! 3. Writes JSON-RPC responses to stdout through a single writer task

use std::sync::Arc;

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, error, info, warn};

use crate::backend::{BackendError, ToolBackend};
use crate::mcp::protocol::*;
use crate::naming::{to_human_name, to_machine_name};
use crate::ServerError;

/// MCP server bridging local clients to the tool backend
///
/// Holds no per-request state; clones share the same backend.
pub struct McpServer<B> {
    backend: Arc<B>,
}

impl<B> Clone for McpServer<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
        }
    }
}

impl<B: ToolBackend + 'static> McpServer<B> {
    /// Create a new MCP server
    pub fn new(backend: B) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Run the MCP server over stdin/stdout
    pub async fn run(self) -> Result<(), ServerError> {
        info!("Starting MCP server, waiting for JSON-RPC requests...");
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Serve JSON-RPC over an arbitrary reader/writer pair
    ///
    /// Returns once the reader reaches EOF and every in-flight response has
    /// been written.
    pub async fn serve<R, W>(self, reader: R, writer: W) -> Result<(), ServerError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();
        let writer_task = tokio::spawn(write_responses(writer, rx));

        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            buf.clear();

            // Raw bytes so one undecodable line only fails that line
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => {
                    info!("MCP server shutting down (stdin closed)");
                    break;
                }
                Ok(_) => match std::str::from_utf8(&buf) {
                    Ok(line) => self.dispatch_line(line, &tx),
                    Err(e) => {
                        error!("Request line is not valid UTF-8: {}", e);
                        let _ = tx.send(JsonRpcResponse::error(
                            Value::Null,
                            error_codes::PARSE_ERROR,
                            format!("Invalid UTF-8: {}", e),
                            None,
                        ));
                    }
                },
                Err(e) => {
                    error!("Failed to read from stdin: {}", e);
                    break;
                }
            }
        }

        // The writer finishes once every spawned request has dropped its sender
        drop(tx);
        writer_task.await.map_err(std::io::Error::other)?
    }

    /// Parse one line and hand the request off to its own task
    fn dispatch_line(&self, line: &str, tx: &UnboundedSender<JsonRpcResponse>) {
        let request = match parse_line(line) {
            Ok(Some(request)) => request,
            Ok(None) => return,
            Err(response) => {
                let _ = tx.send(response);
                return;
            }
        };

        let server = self.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            if let Some(response) = server.handle_request(request).await {
                let _ = tx.send(response);
            }
        });
    }

    /// Handle a JSON-RPC request, returning nothing for notifications
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = match request.id {
            Some(id) => id,
            None => {
                debug!(method = %request.method, "Received notification");
                return None;
            }
        };

        let response = match request.method.as_str() {
            "initialize" => self.handle_initialize(id, request.params),
            "initialized" | "notifications/initialized" => JsonRpcResponse::success(id, json!({})),
            "ping" => JsonRpcResponse::success(id, json!({})),
            "tools/list" => self.handle_tools_list(id).await,
            "tools/call" => self.handle_tools_call(id, request.params).await,
            _ => JsonRpcResponse::error(
                id,
                error_codes::METHOD_NOT_FOUND,
                format!("Method '{}' not found", request.method),
                None,
            ),
        };

        Some(response)
    }

    /// List tools from the backend with names rewritten to machine form
    pub async fn list_tools(&self) -> Result<Value, BackendError> {
        let mut payload = self.backend.list_tools().await?;
        rewrite_tool_names(&mut payload);
        Ok(payload)
    }

    /// Forward a tool call with its name rewritten to the backend's form
    pub async fn call_tool(&self, params: ToolCallParams) -> Result<Value, BackendError> {
        let backend_name = to_human_name(&params.name);
        info!(tool = %params.name, backend_tool = %backend_name, "Forwarding tool call");
        self.backend.call_tool(&backend_name, params.arguments).await
    }

    fn handle_initialize(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let params: InitializeParams = params
            .and_then(|p| serde_json::from_value(p).ok())
            .unwrap_or_default();

        match params.client_info {
            Some(ref client) => info!(client = %client.name, "MCP client connected"),
            None => info!("MCP client connected"),
        }

        match serde_json::to_value(InitializeResult::negotiate(&params)) {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => JsonRpcResponse::error(id, error_codes::INTERNAL_ERROR, e.to_string(), None),
        }
    }

    async fn handle_tools_list(&self, id: Value) -> JsonRpcResponse {
        match self.list_tools().await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                warn!("tools/list failed: {}", e);
                JsonRpcResponse::backend_error(id, &e)
            }
        }
    }

    async fn handle_tools_call(&self, id: Value, params: Option<Value>) -> JsonRpcResponse {
        let tool_params: ToolCallParams = match params {
            Some(params) => match serde_json::from_value(params) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::error(
                        id,
                        error_codes::INVALID_PARAMS,
                        format!("Invalid parameters: {}", e),
                        None,
                    );
                }
            },
            None => {
                return JsonRpcResponse::error(
                    id,
                    error_codes::INVALID_PARAMS,
                    "Missing parameters".to_string(),
                    None,
                );
            }
        };

        match self.call_tool(tool_params).await {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(e) => {
                warn!("tools/call failed: {}", e);
                JsonRpcResponse::backend_error(id, &e)
            }
        }
    }
}

/// Rewrite every `tools[].name` string to machine form in place
///
/// Entries without a string name, and payloads without a `tools` array, are
/// left untouched.
pub fn rewrite_tool_names(payload: &mut Value) {
    let Some(tools) = payload.get_mut("tools").and_then(Value::as_array_mut) else {
        return;
    };

    for tool in tools {
        if let Some(name) = tool.get_mut("name") {
            if let Some(machine) = name.as_str().map(to_machine_name) {
                *name = Value::String(machine);
            }
        }
    }
}

/// Parse a line of input into a request
///
/// Blank lines yield `Ok(None)`; malformed input yields the error response to send.
fn parse_line(line: &str) -> Result<Option<JsonRpcRequest>, JsonRpcResponse> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    debug!("Processing request: {}", line);

    let value: Value = serde_json::from_str(line).map_err(|e| {
        error!("Failed to parse JSON-RPC request: {}", e);
        JsonRpcResponse::error(
            Value::Null,
            error_codes::PARSE_ERROR,
            format!("Invalid JSON: {}", e),
            None,
        )
    })?;

    let id = value.get("id").cloned().unwrap_or(Value::Null);
    serde_json::from_value(value).map(Some).map_err(|e| {
        JsonRpcResponse::error(
            id,
            error_codes::INVALID_REQUEST,
            format!("Invalid request: {}", e),
            None,
        )
    })
}

async fn write_responses<W>(
    mut writer: W,
    mut rx: UnboundedReceiver<JsonRpcResponse>,
) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let response_str = serde_json::to_string(&response)?;

        // Write response + newline
        writer.write_all(response_str.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;

        debug!("Sent response: {}", response_str);
    }

    Ok(())
}
