//! MCP (Model Context Protocol) message structures and JSON-RPC handling
//!
//! Defines the JSON-RPC messages exchanged with MCP clients over stdio.
//! Tool payloads themselves stay opaque `Value`s: the backend owns their shape.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::backend::BackendError;

/// Latest MCP protocol version we speak
pub const MCP_VERSION: &str = "2025-06-18";

/// Protocol versions a client may negotiate
pub const SUPPORTED_VERSIONS: &[&str] = &["2024-11-05", "2025-03-26", "2025-06-18"];

/// Name reported in `serverInfo`
pub const SERVER_NAME: &str = "gigahard-mcp-server";

/// Description reported as `instructions` during initialization
pub const SERVER_DESCRIPTION: &str =
    "Smuggle your HAR requests and turn them into MCP-usable tools";

/// JSON-RPC 2.0 request or notification
///
/// Notifications have no `id` and never get a response.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (always "2.0")
    #[serde(default)]
    pub jsonrpc: String,
    /// Request identifier, absent for notifications; an explicit `null` is kept
    #[serde(default, deserialize_with = "present")]
    pub id: Option<Value>,
    /// The method to invoke (e.g., "tools/call")
    pub method: String,
    /// Parameters for the method call
    #[serde(default)]
    pub params: Option<Value>,
}

impl JsonRpcRequest {
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }
}

/// JSON-RPC 2.0 response message
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0")
    pub jsonrpc: String,
    /// Request ID that we're responding to
    pub id: Value,
    /// Successful result (if no error occurred)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error information (if something went wrong)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC error information
#[derive(Debug, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code (standard JSON-RPC codes)
    pub code: i32,
    /// Human-readable error message
    pub message: String,
    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// MCP tool call parameters
///
/// `name` is in machine form; `arguments` is forwarded to the backend untouched.
#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default, deserialize_with = "present")]
    pub arguments: Option<Value>,
}

/// Distinguish a field set to `null` (`Some(Value::Null)`) from a missing one
fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

/// MCP initialization request parameters
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    /// MCP protocol version the client asks for
    #[serde(default)]
    pub protocol_version: Option<String>,
    /// Client information
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// Information about the MCP client
#[derive(Debug, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// MCP initialization response
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResult {
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    pub server_info: ServerInfo,
    pub instructions: String,
}

/// MCP server capabilities
///
/// Tools are listed dynamically by the backend; resources are advertised but empty.
#[derive(Debug, Serialize)]
pub struct ServerCapabilities {
    pub resources: Value,
    pub tools: Value,
}

/// Information about this server
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

// JSON-RPC error codes (standard codes)
pub mod error_codes {
    /// Parse error - Invalid JSON was received by the server
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid Request - The JSON sent is not a valid Request object
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found - The requested method doesn't exist
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid parameters - Method exists but parameters are wrong
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error - Internal JSON-RPC error
    pub const INTERNAL_ERROR: i32 = -32603;
}

impl JsonRpcResponse {
    /// Create a successful response
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Value, code: i32, message: String, data: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data,
            }),
        }
    }

    /// Report a backend failure as an internal error
    ///
    /// The message is the backend error's own message; `data` names the error
    /// kind and, for HTTP failures, the backend status.
    pub fn backend_error(id: Value, err: &BackendError) -> Self {
        let mut data = json!({ "kind": err.kind().as_str() });
        if let Some(status) = err.status() {
            data["status"] = json!(status);
        }
        Self::error(id, error_codes::INTERNAL_ERROR, err.to_string(), Some(data))
    }
}

impl InitializeResult {
    /// Build the initialization answer, echoing the client's version when supported
    pub fn negotiate(params: &InitializeParams) -> Self {
        let protocol_version = params
            .protocol_version
            .as_deref()
            .filter(|v| SUPPORTED_VERSIONS.contains(v))
            .unwrap_or(MCP_VERSION)
            .to_string();

        Self {
            protocol_version,
            capabilities: ServerCapabilities {
                resources: json!({}),
                tools: json!({}),
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: SERVER_DESCRIPTION.to_string(),
        }
    }
}
