//! HTTP request tools.
//!
//! One file per tool. Each tool only declares its arguments and metadata;
//! execution goes through the shared `ToolDispatcher`.

pub mod common;
pub mod delete;
pub mod get;
pub mod post;
pub mod put;
pub mod request;

pub use common::ApiCall;
pub use delete::{ApiDeleteParams, ApiDeleteTool};
pub use get::{ApiGetParams, ApiGetTool};
pub use post::{ApiPostParams, ApiPostTool};
pub use put::{ApiPutParams, ApiPutTool};
pub use request::{ApiRequestParams, ApiRequestTool};
