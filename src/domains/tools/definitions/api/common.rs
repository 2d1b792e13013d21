//! Shared pieces of the HTTP request tools.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::FutureExt;
use rmcp::{
    ErrorData as McpError,
    handler::server::tool::{ToolCallContext, ToolRoute, cached_schema_for_type},
    model::Tool,
};
use schemars::JsonSchema;
use serde_json::Value;

use crate::domains::api::{HttpMethod, OutputFormat};
use crate::domains::tools::dispatcher::{Operation, ToolDispatcher};

/// Tool arguments after deserialization, before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiCall {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub params: BTreeMap<String, String>,
    pub data: Option<Value>,
    pub format: OutputFormat,
}

/// Build the advertised metadata for a tool whose arguments are `P`.
pub fn tool_model<P>(name: &'static str, description: &'static str) -> Tool
where
    P: JsonSchema + 'static,
{
    Tool {
        name: name.into(),
        description: Some(description.into()),
        input_schema: cached_schema_for_type::<P>(),
        annotations: None,
        output_schema: None,
        icons: None,
        meta: None,
        title: None,
    }
}

/// Create a ToolRoute that forwards raw arguments to the dispatcher.
///
/// Arguments are not deserialized here so that malformed input becomes a
/// tool-level error response rather than a protocol error.
pub fn dispatch_route<S>(
    tool: Tool,
    operation: Operation,
    dispatcher: Arc<ToolDispatcher>,
) -> ToolRoute<S>
where
    S: Send + Sync + 'static,
{
    ToolRoute::new_dyn(tool, move |ctx: ToolCallContext<'_, S>| {
        let arguments = Value::Object(ctx.arguments.clone().unwrap_or_default());
        let dispatcher = dispatcher.clone();
        async move {
            let response = dispatcher.invoke(operation, arguments).await;
            Ok::<_, McpError>(response.into_call_tool_result())
        }
        .boxed()
    })
}
