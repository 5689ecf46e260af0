//! MCP protocol implementation
//!
//! This module handles the Model Context Protocol communication,
//! including JSON-RPC parsing and forwarding to the backend.

pub mod protocol;
pub mod server;

// Re-export main types
pub use server::{rewrite_tool_names, McpServer};
