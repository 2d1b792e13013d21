//! Tools domain module.
//!
//! The five HTTP request tools exposed to MCP clients.
//!
//! ## Architecture
//!
//! - `definitions/` - Tool arguments and metadata (one file per tool)
//! - `dispatcher.rs` - Validation, execution and rendering for every tool
//! - `router.rs` - rmcp ToolRouter builder for the STDIO transport
//! - `error.rs` - Tool-specific error types
//!
//! ## Adding a New Tool
//!
//! 1. Create a new file in `definitions/api/` with params and `create_route()`
//! 2. Add an `Operation` variant in `dispatcher.rs`
//! 3. Add the route in `router.rs`

pub mod definitions;
pub mod dispatcher;
mod error;
pub mod router;

pub use dispatcher::{Operation, ToolDispatcher, ToolResponse};
pub use error::ToolError;
pub use router::build_tool_router;
