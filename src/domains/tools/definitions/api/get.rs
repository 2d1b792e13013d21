//! GET request tool definition.

use std::collections::BTreeMap;
use std::sync::Arc;

use rmcp::{handler::server::tool::ToolRoute, model::Tool};
use schemars::JsonSchema;
use serde::Deserialize;

use super::common::{ApiCall, dispatch_route, tool_model};
use crate::domains::api::{HttpMethod, OutputFormat};
use crate::domains::tools::dispatcher::{Operation, ToolDispatcher};

/// Parameters for the GET tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ApiGetParams {
    /// Absolute URL to request.
    #[schemars(description = "Absolute URL to request (http or https)")]
    pub url: String,

    /// Request headers.
    #[schemars(description = "Request headers as name/value pairs")]
    #[serde(default)]
    pub headers: BTreeMap<String, String>,

    /// Query string parameters.
    #[schemars(description = "Query string parameters as name/value pairs")]
    #[serde(default)]
    pub params: BTreeMap<String, String>,

    /// Output format.
    #[schemars(description = "Response format: json (default) or csv")]
    #[serde(default)]
    pub format: OutputFormat,
}

impl From<ApiGetParams> for ApiCall {
    fn from(p: ApiGetParams) -> Self {
        Self {
            method: HttpMethod::Get,
            url: p.url,
            headers: p.headers,
            params: p.params,
            data: None,
            format: p.format,
        }
    }
}

/// GET tool - fetches a URL.
pub struct ApiGetTool;

impl ApiGetTool {
    /// Tool name as registered in MCP.
    pub const NAME: &'static str = "api_get";

    /// Tool description shown to clients.
    pub const DESCRIPTION: &'static str = "Send an HTTP GET request. Returns status, headers, body and response time as JSON, or as CSV when format is \"csv\".";

    /// Create a Tool model for this tool (metadata).
    pub fn to_tool() -> Tool {
        tool_model::<ApiGetParams>(Self::NAME, Self::DESCRIPTION)
    }

    /// Create a ToolRoute for STDIO transport.
    pub fn create_route<S>(dispatcher: Arc<ToolDispatcher>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        dispatch_route(Self::to_tool(), Operation::Get, dispatcher)
    }
}
