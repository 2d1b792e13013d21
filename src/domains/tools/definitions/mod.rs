//! Tool definitions module.
//!
//! This module exports all available tool definitions.
//! Each tool is defined in its own file for better maintainability.

pub mod api;

pub use api::{
    ApiCall, ApiDeleteParams, ApiDeleteTool, ApiGetParams, ApiGetTool, ApiPostParams,
    ApiPostTool, ApiPutParams, ApiPutTool, ApiRequestParams, ApiRequestTool,
};
