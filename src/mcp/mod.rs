//! MCP integration: shared context, stdio server, and tool handlers.
pub mod server;
pub mod tools;
