//! MCP server wiring: shared context plus stdio startup via `rmcp`.

use crate::mcp::tools::AppTools;
use anyhow::{Context, Result};
use rmcp::{ServiceExt, handler::server::router::Router, transport::io::stdio};
use std::sync::Arc;

use crate::{config::Config, db::Db, embedder::Embedder};
use tokio::sync::Mutex as TokioMutex;

/// State shared by every tool handler: the store, the active
/// configuration, and the embedding backend.
#[derive(Clone)]
pub struct McpContext {
    pub db: Arc<TokioMutex<Db>>,
    pub config: Arc<Config>,
    pub embedder: Arc<dyn Embedder>,
}

#[derive(Clone)]
pub struct McpServer {
    pub ctx: McpContext,
}

impl McpServer {
    pub fn new(ctx: McpContext) -> Self {
        Self { ctx }
    }

    /// Serve tools over stdio until the client disconnects.
    pub async fn start(self) -> Result<()> {
        tracing::info!("Serving MCP tools over stdio");
        let (stdin, stdout) = stdio();

        let tools = AppTools::new(self.ctx);
        let router = Router::new(tools.clone()).with_tools(tools.tool_router.clone());

        router
            .serve((stdin, stdout))
            .await
            .context("stdio transport failed")?;

        Ok(())
    }
}
