//! Backend layer for reaching the remote tool catalog
//!
//! The backend owns every tool: its name, schema and execution. This module
//! only knows how to ask it for the catalog and how to forward a call.

pub mod http;

// Re-export the main backend types
pub use http::*;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::ErrorKind;

/// Errors that can occur while talking to the backend
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The backend answered with a non-success status
    #[error("{message}")]
    Http { status: u16, message: String },

    /// The backend could not be reached or its response could not be read
    #[error("Failed to connect to backend: {0}")]
    Connectivity(String),
}

impl BackendError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BackendError::Http { .. } => ErrorKind::BackendHttp,
            BackendError::Connectivity(_) => ErrorKind::Connectivity,
        }
    }

    /// HTTP status reported by the backend, if it answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            BackendError::Http { status, .. } => Some(*status),
            BackendError::Connectivity(_) => None,
        }
    }
}

impl From<reqwest::Error> for BackendError {
    fn from(e: reqwest::Error) -> Self {
        BackendError::Connectivity(e.to_string())
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(e: serde_json::Error) -> Self {
        BackendError::Connectivity(e.to_string())
    }
}

/// Trait defining the operations the MCP server forwards to the backend
///
/// Payloads are opaque JSON: the backend decides what a tool list or a tool
/// result looks like. Tool names here are always in the backend's
/// human-readable form.
#[async_trait]
pub trait ToolBackend: Send + Sync {
    /// Fetch the tool catalog
    async fn list_tools(&self) -> Result<Value, BackendError>;

    /// Invoke a tool by its human-readable name
    async fn call_tool(
        &self,
        tool_name: &str,
        arguments: Option<Value>,
    ) -> Result<Value, BackendError>;
}
