//! POST request tool definition.

use std::collections::BTreeMap;
use std::sync::Arc;

use rmcp::{handler::server::tool::ToolRoute, model::Tool};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::common::{ApiCall, dispatch_route, tool_model};
use crate::domains::api::{HttpMethod, OutputFormat};
use crate::domains::tools::dispatcher::{Operation, ToolDispatcher};

/// Parameters for the POST tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ApiPostParams {
    /// Absolute URL to post to.
    #[schemars(description = "Absolute URL to request (http or https)")]
    pub url: String,

    /// Request body. Strings are sent as-is, anything else as JSON.
    #[schemars(description = "Request body: a string is sent verbatim, any other value as JSON")]
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

impl From<ApiPostParams> for ApiCall {
    fn from(p: ApiPostParams) -> Self {
        Self {
            method: HttpMethod::Post,
            url: p.url,
            headers: p.headers,
            params: p.params,
            data: p.data,
            format: p.format,
        }
    }
}

/// POST tool - submits data to a URL.
pub struct ApiPostTool;

impl ApiPostTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "api_post";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Send an HTTP POST request with an optional body. Returns status, headers, body, response time and the data sent, as JSON or CSV.";

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        tool_model::<ApiPostParams>(Self::NAME, Self::DESCRIPTION)
    }

    /// Create a ToolRoute for STDIO transport.
    pub fn create_route<S>(dispatcher: Arc<ToolDispatcher>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        dispatch_route(Self::to_tool(), Operation::Post, dispatcher)
    }
}
