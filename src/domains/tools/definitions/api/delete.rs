//! DELETE request tool definition.

use std::collections::BTreeMap;
use std::sync::Arc;

use rmcp::{handler::server::tool::ToolRoute, model::Tool};
use schemars::JsonSchema;
use serde::Deserialize;

use super::common::{ApiCall, dispatch_route, tool_model};
use crate::domains::api::{HttpMethod, OutputFormat};
use crate::domains::tools::dispatcher::{Operation, ToolDispatcher};

/// Parameters for the DELETE tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct ApiDeleteParams {
    #[schemars(description = "Absolute URL of the resource to delete (http or https)")]
    pub url: String,

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

impl From<ApiDeleteParams> for ApiCall {
    fn from(p: ApiDeleteParams) -> Self {
        Self {
            method: HttpMethod::Delete,
            url: p.url,
            headers: p.headers,
            params: p.params,
            data: None,
            format: p.format,
        }
    }
}

/// DELETE tool - removes a resource.
pub struct ApiDeleteTool;

impl ApiDeleteTool {
    pub const NAME: &'static str = "api_delete";

    pub const DESCRIPTION: &'static str = "Send an HTTP DELETE request. Returns status, headers, body and response time as JSON, or as CSV when format is \"csv\".";

    pub fn to_tool() -> Tool {
        tool_model::<ApiDeleteParams>(Self::NAME, Self::DESCRIPTION)
    }

    pub fn create_route<S>(dispatcher: Arc<ToolDispatcher>) -> ToolRoute<S>
    where
        S: Send + Sync + 'static,
    {
        dispatch_route(Self::to_tool(), Operation::Delete, dispatcher)
    }
}
