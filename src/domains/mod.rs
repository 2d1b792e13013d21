//! Domains module containing business logic organized by bounded contexts.
//!
//! `api` knows how to perform and describe an HTTP call; `tools` exposes it
//! to MCP clients.

pub mod api;
pub mod tools;
