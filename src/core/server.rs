//! MCP Server implementation and lifecycle management.
//!
//! This module contains the main server handler that implements the MCP
//! protocol by delegating to the tool dispatcher.
//!
//! ## Tool Architecture
//!
//! Tools are declared in `domains/tools/definitions/api/` with one file per
//! tool. Every call, whatever the transport, ends up in
//! `ToolDispatcher::invoke`. The STDIO transport reaches it through the
//! rmcp `ToolRouter` built in `domains/tools/router.rs`, the HTTP transport
//! through [`McpServer::call_tool`].

use rmcp::{ServerHandler, handler::server::tool::ToolRouter, model::*, tool_handler};
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use super::config::Config;
use super::error::Result as ServerResult;
use crate::domains::tools::{ToolDispatcher, build_tool_router};

/// The main MCP server handler.
///
/// This struct implements the `ServerHandler` trait from rmcp. It owns the
/// single `ToolDispatcher` shared by every transport.
#[derive(Clone)]
pub struct McpServer {
    /// Server configuration.
    config: Arc<Config>,

    /// Dispatcher behind every tool call.
    dispatcher: Arc<ToolDispatcher>,

    /// Tool router for handling tool calls.
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    /// Create a new MCP server with the given configuration.
    ///
    /// Fails only if the outbound HTTP client cannot be built.
    pub fn new(config: Config) -> ServerResult<Self> {
        let dispatcher = Arc::new(ToolDispatcher::from_config(&config)?);
        Ok(Self::with_dispatcher(config, dispatcher))
    }

    /// Create a server around an existing dispatcher.
    pub fn with_dispatcher(config: Config, dispatcher: Arc<ToolDispatcher>) -> Self {
        info!(
            "Tools: strict_validation={}, csv_enabled={}",
            config.tools.strict_validation, config.tools.csv_enabled
        );
        Self {
            tool_router: build_tool_router::<Self>(dispatcher.clone()),
            config: Arc::new(config),
            dispatcher,
        }
    }

    /// Get the server name.
    pub fn name(&self) -> &str {
        &self.config.server.name
    }

    /// Get the server version.
    pub fn version(&self) -> &str {
        &self.config.server.version
    }

    /// Get the server configuration.
    pub fn config(&self) -> &Arc<Config> {
        &self.config
    }

    // ========================================================================
    // HTTP Transport Support Methods
    // ========================================================================

    /// List all available tools (for HTTP transport).
    pub fn list_tools(&self) -> Vec<Value> {
        self.tool_router
            .list_all()
            .into_iter()
            .map(|t| {
                serde_json::json!({
                    "name": t.name,
                    "description": t.description,
                    "inputSchema": t.input_schema
                })
            })
            .collect()
    }

    /// Call a tool by name (for HTTP transport).
    ///
    /// Returns the `tools/call` result body. Tool-level errors are reported
    /// inside it with `isError: true`.
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Value {
        self.dispatcher.dispatch(name, arguments).await.to_json()
    }
}

/// ServerHandler implementation with tool_handler macro for automatic tool routing.
#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "HTTP API testing server. Use api_get, api_post, api_put, api_delete or \
                 api_request to call an endpoint; results come back as JSON or CSV."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: self.config.server.name.clone(),
                version: self.config.server.version.clone(),
                ..Implementation::from_build_env()
            },
            ..Default::default()
        }
    }
}
