//! Public library interface for the Gigahard MCP server
//!
//! The server speaks MCP over stdin/stdout and forwards tool listing and tool
//! calls to the Gigahard backend, which owns the actual tool catalog.

use std::sync::Arc;
use thiserror::Error;

// Internal modules
pub mod backend;
pub mod config;
pub mod mcp;
pub mod naming;

// Re-export public modules and types
pub use backend::{BackendError, HttpBackend, ToolBackend};
pub use config::{ApiKeyPolicy, Config, ConfigError, ConfigInput};
pub use mcp::McpServer;
pub use naming::{to_human_name, to_machine_name};

/// Closed classification of everything that can go wrong
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A required setting was missing or invalid at startup
    Configuration,
    /// The backend answered with a non-success status
    BackendHttp,
    /// The backend could not be reached or sent an unreadable response
    Connectivity,
}

impl ErrorKind {
    /// Stable identifier used in JSON-RPC error data
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::BackendHttp => "backend_http",
            ErrorKind::Connectivity => "connectivity",
        }
    }
}

/// Errors that can occur during server operation
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Main server wiring the configuration, the HTTP backend and the MCP loop
pub struct GigahardServer {
    config: Arc<Config>,
    backend: HttpBackend,
}

impl GigahardServer {
    /// Create a server for a validated configuration
    pub fn new(config: Config) -> Result<Self, ServerError> {
        tracing::info!(
            backend = %config.backend_url,
            api_key = if config.api_key.is_some() { "configured" } else { "missing" },
            mcp_id = config.mcp_id.as_deref().unwrap_or("default"),
            "Initializing Gigahard MCP server"
        );

        let config = Arc::new(config);
        let backend = HttpBackend::new(Arc::clone(&config))?;

        Ok(Self { config, backend })
    }

    /// Run the MCP server, handling JSON-RPC requests over stdin/stdout
    ///
    /// Returns when stdin is closed.
    pub async fn run(self) -> Result<(), ServerError> {
        McpServer::new(self.backend).run().await
    }

    /// Get the configuration (useful for testing)
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get the backend client (useful for testing)
    pub fn backend(&self) -> &HttpBackend {
        &self.backend
    }
}
