//! API Tester MCP Server Library
//!
//! An MCP server that lets clients exercise HTTP APIs through five tools:
//! `api_get`, `api_post`, `api_put`, `api_delete` and `api_request`. Every
//! call produces one normalized result, rendered as JSON or CSV, and failed
//! calls are appended to a durable error log.
//!
//! # Architecture
//!
//! - **core**: Configuration, error handling, the MCP server and transports
//! - **domains**: Business logic organized by bounded contexts
//!   - **api**: Request execution, result normalization, CSV and error log
//!   - **tools**: MCP tool definitions, dispatcher and router
//!
//! # Example
//!
//! ```rust,no_run
//! use api_tester_mcp_server::{core::McpServer, core::Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env();
//!     let server = McpServer::new(config)?;
//!     // Start the server...
//!     Ok(())
//! }
//! ```

pub mod core;
pub mod domains;

// Re-export commonly used types for convenience
pub use core::{Config, Error, McpServer, Result};
