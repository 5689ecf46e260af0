//! HTTP implementation of the tool backend
//!
//! Every request carries the `X-MCP-API-Key` header (empty when no key is
//! configured) and, when a routing identifier is set, an `mcpId` query
//! parameter selecting which backend-side tool configuration to address.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::{BackendError, ToolBackend};
use crate::config::{Config, ConfigError};

/// Backend endpoint returning the tool catalog
pub const LIST_TOOLS_PATH: &str = "api/mcp/list-tools";
/// Backend endpoint executing a tool
pub const CALL_TOOL_PATH: &str = "api/mcp/call-tool";
/// Header carrying the API key
pub const API_KEY_HEADER: &str = "x-mcp-api-key";
/// Query parameter carrying the routing identifier
pub const MCP_ID_PARAM: &str = "mcpId";

const USER_AGENT: &str = concat!("gigahard-mcp/", env!("CARGO_PKG_VERSION"));

/// Body of a call-tool request
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CallToolBody<'a> {
    tool_name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    arguments: Option<&'a Value>,
}

/// Error body the backend may send with a failed call
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Tool backend reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    config: Arc<Config>,
}

impl HttpBackend {
    /// Create a backend client for the given configuration
    pub fn new(config: Arc<Config>) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            HeaderName::from_static(API_KEY_HEADER),
            HeaderValue::from_str(config.api_key_header())
                .map_err(|_| ConfigError::InvalidApiKey)?,
        );
        headers.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self { client, config })
    }

    /// The configuration this backend was built with
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Build a request for an endpoint, with the routing identifier attached
    fn request(&self, method: Method, path: &str) -> Result<RequestBuilder, BackendError> {
        let url = self
            .config
            .endpoint(path)
            .map_err(|e| BackendError::Connectivity(e.to_string()))?;
        debug!(method = %method, url = %url, "Backend request");

        let mut builder = self.client.request(method, url);
        if let Some(ref mcp_id) = self.config.mcp_id {
            builder = builder.query(&[(MCP_ID_PARAM, mcp_id.as_str())]);
        }
        Ok(builder)
    }
}

#[async_trait]
impl ToolBackend for HttpBackend {
    async fn list_tools(&self) -> Result<Value, BackendError> {
        let response = self.request(Method::GET, LIST_TOOLS_PATH)?.send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await?;
            warn!(status = status.as_u16(), "Backend rejected list-tools");
            return Err(BackendError::Http {
                status: status.as_u16(),
                message: format!("Backend error: {} - {}", status_text(status), body),
            });
        }

        read_json(response).await
    }

    async fn call_tool(
        &self,
        tool_name: &str,
        arguments: Option<Value>,
    ) -> Result<Value, BackendError> {
        let body = CallToolBody {
            tool_name,
            arguments: arguments.as_ref(),
        };
        let response = self
            .request(Method::POST, CALL_TOOL_PATH)?
            .json(&body)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await?;
            warn!(status = status.as_u16(), tool = tool_name, "Backend rejected call-tool");
            return Err(call_tool_error(status, &body));
        }

        read_json(response).await
    }
}

async fn read_json(response: Response) -> Result<Value, BackendError> {
    let bytes = response.bytes().await?;
    Ok(serde_json::from_slice(&bytes)?)
}

/// Prefer the backend's own `error` message, fall back to the status text
fn call_tool_error(status: StatusCode, body: &str) -> BackendError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .map(|b| b.error)
        .filter(|e| !e.is_empty())
        .unwrap_or_else(|| format!("Backend error: {}", status_text(status)));

    BackendError::Http {
        status: status.as_u16(),
        message,
    }
}

fn status_text(status: StatusCode) -> &'static str {
    status.canonical_reason().unwrap_or("")
}
