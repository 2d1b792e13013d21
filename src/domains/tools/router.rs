//! Tool Router - builds the rmcp ToolRouter for the HTTP request tools.
//!
//! Each tool definition creates its own route; every route forwards to the
//! shared `ToolDispatcher`.

use std::sync::Arc;

use rmcp::handler::server::tool::ToolRouter;

use super::definitions::{ApiDeleteTool, ApiGetTool, ApiPostTool, ApiPutTool, ApiRequestTool};
use super::dispatcher::ToolDispatcher;

/// Build the tool router with all registered tools.
pub fn build_tool_router<S>(dispatcher: Arc<ToolDispatcher>) -> ToolRouter<S>
where
    S: Send + Sync + 'static,
{
    ToolRouter::new()
        .with_route(ApiGetTool::create_route(dispatcher.clone()))
        .with_route(ApiPostTool::create_route(dispatcher.clone()))
        .with_route(ApiPutTool::create_route(dispatcher.clone()))
        .with_route(ApiDeleteTool::create_route(dispatcher.clone()))
        .with_route(ApiRequestTool::create_route(dispatcher))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::ToolsConfig;
    use crate::domains::api::{ErrorLogger, HttpExecutor};
    use crate::domains::tools::Operation;

    struct TestServer {}

    fn test_dispatcher() -> Arc<ToolDispatcher> {
        let executor = HttpExecutor::new(&Default::default()).unwrap();
        Arc::new(ToolDispatcher::new(
            Arc::new(executor),
            ErrorLogger::disabled(),
            ToolsConfig::default(),
        ))
    }

    #[test]
    fn test_build_router() {
        let router: ToolRouter<TestServer> = build_tool_router(test_dispatcher());
        let tools = router.list_all();
        assert_eq!(tools.len(), 5);

        for tool in &tools {
            assert!(tool.description.is_some());
            assert!(tool.input_schema.contains_key("properties"));
        }
    }

    #[test]
    fn test_router_matches_operations() {
        let router: ToolRouter<TestServer> = build_tool_router(test_dispatcher());
        let router_tools = router.list_all();
        let router_names: Vec<_> = router_tools.iter().map(|t| t.name.as_ref()).collect();

        assert_eq!(router_names.len(), Operation::ALL.len());
        for op in Operation::ALL {
            assert!(router_names.contains(&op.name()));
        }
    }
}
