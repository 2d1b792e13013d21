//! PUT request tool definition.

use std::collections::BTreeMap;
use std::sync::Arc;

use rmcp::{handler::server::tool::ToolRoute, model::Tool};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;

use super::common::{ApiCall, dispatch_route, tool_model};
use crate::domains::api::{HttpMethod, OutputFormat};
use crate::domains::tools::dispatcher::{Operation, ToolDispatcher};

/// Parameters for the PUT tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ApiPutParams {
    #[schemars(description = "Absolute URL to request (http or https)")]
    pub url: String,

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

impl From<ApiPutParams> for ApiCall {
    fn from(p: ApiPutParams) -> Self {
        Self {
            method: HttpMethod::Put,
            url: p.url,
            headers: p.headers,
            params: p.params,
            data: p.data,
            format: p.format,
        }
    }
}

/// PUT tool - replaces a resource.
pub struct ApiPutTool;

impl ApiPutTool {
    pub const NAME: &'static str = "api_put";

    pub const DESCRIPTION: &'static str = "Send an HTTP PUT request with an optional body. Returns status, headers, body, response time and the data sent, as JSON or CSV.";

    pub fn to_tool() -> Tool {
        tool_model::<ApiPutParams>(Self::NAME, Self::DESCRIPTION)
    }

    pub fn create_route<S>(dispatcher: Arc<ToolDispatcher>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        dispatch_route(Self::to_tool(), Operation::Put, dispatcher)
    }
}
