//! Generic request tool definition.
//!
//! The only tool where the method is an argument rather than implied by
//! the tool name.

use std::collections::BTreeMap;
use std::sync::Arc;

use rmcp::{handler::server::tool::ToolRoute, model::Tool};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::common::{ApiCall, dispatch_route, tool_model};
use crate::domains::api::{HttpMethod, OutputFormat};
use crate::domains::tools::dispatcher::{Operation, ToolDispatcher};

/// Parameters for the generic request tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ApiRequestParams {
    /// HTTP method token.
    #[schemars(description = "HTTP method: GET, POST, PUT, DELETE, PATCH, HEAD or OPTIONS")]
    pub method: HttpMethod,

    #[schemars(description = "Absolute URL to request (http or https)")]
    pub url: String,

    /// Only sent for POST, PUT and PATCH.
    #[schemars(description = "Request body, used for POST, PUT and PATCH only")]
    #[serde(default)]
    pub data: Option<Value>,

    #[schemars(description = "Request headers as name/value pairs")]
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    #[schemars(description = "Query string parameters as name/value pairs")]
    #[serde(default)]
    pub params: BTreeMap<String, String>,

    #[schemars(description = "Response format: json (default) or csv")]
    #[serde(default)]
    pub format: OutputFormat,
}

impl From<ApiRequestParams> for ApiCall {
    fn from(p: ApiRequestParams) -> Self {
        Self {
            method: p.method,
            url: p.url,
            headers: p.headers,
            params: p.params,
            data: p.data,
            format: p.format,
        }
    }
}

/// Generic request tool - any supported method.
pub struct ApiRequestTool;

impl ApiRequestTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "api_request";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Send an HTTP request with any supported method (GET, POST, PUT, DELETE, PATCH, HEAD, OPTIONS). Returns the normalized result as JSON or CSV.";

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        tool_model::<ApiRequestParams>(Self::NAME, Self::DESCRIPTION)
    }

    /// Create a ToolRoute for STDIO transport.
    pub fn create_route<S>(dispatcher: Arc<ToolDispatcher>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        dispatch_route(Self::to_tool(), Operation::Request, dispatcher)
    }
}
