//! Tool dispatcher - drives one tool invocation end to end.
//!
//! resolve operation -> validate arguments -> execute request -> normalize
//! -> render (JSON or CSV). Failed requests are also written to the error
//! log. Every path returns a [`ToolResponse`].

use std::str::FromStr;
use std::sync::Arc;

use rmcp::model::{CallToolResult, Content};
use serde_json::{Value, json};
use tracing::{error, info, instrument, warn};

use super::ToolError;
use super::definitions::api::{
    ApiCall, ApiDeleteParams, ApiDeleteTool, ApiGetParams, ApiGetTool, ApiPostParams,
    ApiPostTool, ApiPutParams, ApiPutTool, ApiRequestParams, ApiRequestTool,
};
use crate::core::config::{Config, ToolsConfig};
use crate::core::error::Result;
use crate::domains::api::{
    ApiRequest, CanonicalResult, ErrorLogger, HttpExecutor, OutputFormat, RequestExecutor,
    normalize_failure, normalize_success, to_csv,
};

/// The tool operations this server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Get,
    Post,
    Put,
    Delete,
    Request,
}

impl Operation {
    pub const ALL: [Operation; 5] = [
        Operation::Get,
        Operation::Post,
        Operation::Put,
        Operation::Delete,
        Operation::Request,
    ];

    /// Registered tool name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Get => ApiGetTool::NAME,
            Self::Post => ApiPostTool::NAME,
            Self::Put => ApiPutTool::NAME,
            Self::Delete => ApiDeleteTool::NAME,
            Self::Request => ApiRequestTool::NAME,
        }
    }

    /// Deserialize `arguments` with this operation's parameter type.
    fn parse(&self, arguments: Value) -> std::result::Result<ApiCall, serde_json::Error> {
        match self {
            Self::Get => serde_json::from_value::<ApiGetParams>(arguments).map(Into::into),
            Self::Post => serde_json::from_value::<ApiPostParams>(arguments).map(Into::into),
            Self::Put => serde_json::from_value::<ApiPutParams>(arguments).map(Into::into),
            Self::Delete => serde_json::from_value::<ApiDeleteParams>(arguments).map(Into::into),
            Self::Request => {
                serde_json::from_value::<ApiRequestParams>(arguments).map(Into::into)
            }
        }
    }
}

impl FromStr for Operation {
    type Err = ToolError;

    fn from_str(name: &str) -> std::result::Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|op| op.name() == name)
            .ok_or_else(|| ToolError::not_found(name))
    }
}

/// Text payload handed back to the protocol layer.
///
/// `is_error` marks dispatcher-level failures (bad arguments, unknown tool).
/// A failed HTTP call is a normal response carrying a failure-shaped result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolResponse {
    pub text: String,
    pub is_error: bool,
}

impl ToolResponse {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    pub fn error(err: &ToolError) -> Self {
        Self {
            text: format!("Error: {}", err),
            is_error: true,
        }
    }

    pub fn into_call_tool_result(self) -> CallToolResult {
        let content = vec![Content::text(self.text)];
        if self.is_error {
            CallToolResult::error(content)
        } else {
            CallToolResult::success(content)
        }
    }

    /// JSON-RPC `tools/call` result body.
    pub fn to_json(&self) -> Value {
        json!({
            "content": [{ "type": "text", "text": self.text }],
            "isError": self.is_error
        })
    }
}

/// Drives tool invocations. One instance is shared by all transports.
pub struct ToolDispatcher {
    executor: Arc<dyn RequestExecutor>,
    error_log: ErrorLogger,
    options: ToolsConfig,
}

impl ToolDispatcher {
    pub fn new(
        executor: Arc<dyn RequestExecutor>,
        error_log: ErrorLogger,
        options: ToolsConfig,
    ) -> Self {
        Self {
            executor,
            error_log,
            options,
        }
    }

    /// Build the production dispatcher: `reqwest` executor and file error log.
    pub fn from_config(config: &Config) -> Result<Self> {
        let executor = HttpExecutor::new(&config.http_client)?;
        Ok(Self::new(
            Arc::new(executor),
            ErrorLogger::new(&config.error_log),
            config.tools.clone(),
        ))
    }

    /// Resolve `name` and run it.
    pub async fn dispatch(&self, name: &str, arguments: Value) -> ToolResponse {
        match name.parse::<Operation>() {
            Ok(operation) => self.invoke(operation, arguments).await,
            Err(err) => {
                warn!("Unknown tool requested: {}", name);
                self.error_log
                    .log_handler_error(name, &err.to_string(), Some(&arguments));
                ToolResponse::error(&err)
            }
        }
    }

    /// Run one invocation of `operation`.
    #[instrument(skip(self, arguments), fields(tool = operation.name()))]
    pub async fn invoke(&self, operation: Operation, arguments: Value) -> ToolResponse {
        let call = match self.prepare(operation, &arguments) {
            Ok(call) => call,
            Err(err) => {
                warn!("Rejected {} call: {}", operation.name(), err);
                self.error_log
                    .log_handler_error(operation.name(), &err.to_string(), Some(&arguments));
                return ToolResponse::error(&err);
            }
        };

        let format = call.format;
        let request = ApiRequest::new(call.method, call.url)
            .with_headers(call.headers)
            .with_params(call.params)
            .with_body(call.data);

        info!("{} {}", request.method, request.url);

        let result = match self.executor.execute(&request).await {
            Ok(outcome) => {
                info!(
                    status = outcome.response.status,
                    "{} {} completed", request.method, request.url
                );
                normalize_success(&outcome, request.method, &request.url, request.body.as_ref())
            }
            Err(failure) => {
                let result = normalize_failure(
                    &failure,
                    request.method,
                    &request.url,
                    request.body.as_ref(),
                );
                self.error_log
                    .log_failure(&failure, &request, operation.name(), &result);
                result
            }
        };

        ToolResponse::ok(render(&result, format))
    }

    /// Deserialize and validate arguments. No side effects.
    fn prepare(
        &self,
        operation: Operation,
        arguments: &Value,
    ) -> std::result::Result<ApiCall, ToolError> {
        if !arguments.is_object() {
            return Err(ToolError::invalid_arguments(
                "arguments must be a JSON object",
            ));
        }

        let mut arguments = arguments.clone();
        if !self.options.strict_validation {
            normalize_method_case(&mut arguments);
        }

        let mut call = operation
            .parse(arguments)
            .map_err(|e| ToolError::invalid_arguments(e.to_string()))?;

        if call.url.trim().is_empty() {
            return Err(ToolError::invalid_arguments("url must not be empty"));
        }
        if self.options.strict_validation {
            validate_url(&call.url)?;
        }

        if call.format == OutputFormat::Csv && !self.options.csv_enabled {
            if self.options.strict_validation {
                return Err(ToolError::invalid_arguments(
                    "CSV output is disabled on this server",
                ));
            }
            warn!("CSV output disabled, answering {} with JSON", operation.name());
            call.format = OutputFormat::Json;
        }

        Ok(call)
    }
}

/// Encode `result` in the requested format.
pub fn render(result: &CanonicalResult, format: OutputFormat) -> String {
    match format {
        OutputFormat::Csv => to_csv(result),
        OutputFormat::Json => serde_json::to_string_pretty(result).unwrap_or_else(|e| {
            error!("Failed to encode result as JSON: {}", e);
            json!({
                "success": false,
                "method": result.method,
                "url": result.url,
                "error": format!("JSON encoding failed: {}", e),
                "code": "SERIALIZATION_ERROR",
            })
            .to_string()
        }),
    }
}

/// Absolute `http`/`https` URLs only.
fn validate_url(url: &str) -> std::result::Result<(), ToolError> {
    let parsed = reqwest::Url::parse(url)
        .map_err(|e| ToolError::invalid_arguments(format!("invalid url '{}': {}", url, e)))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ToolError::invalid_arguments(format!(
            "unsupported url scheme '{}'",
            other
        ))),
    }
}

fn normalize_method_case(arguments: &mut Value) {
    if let Some(method) = arguments.get_mut("method") {
        if let Some(token) = method.as_str() {
            *method = Value::String(token.trim().to_ascii_uppercase());
        }
    }
}
