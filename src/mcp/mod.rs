//! MCP (Model Context Protocol) server
//!
//! Exposes the documentation cache to AI assistants over stdio with two
//! tools, `search_docs` and `fetch_doc`.

pub mod tools;
pub mod types;

use anyhow::Result;
use rmcp::{
    handler::server::router::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{CallToolResult, Content, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router, ErrorData as McpError, ServerHandler,
};
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::constants::APP_NAME;
use crate::docs::DocCache;

// Re-export types
pub use tools::{fetch_doc, search_docs};
pub use types::*;

/// Documentation search MCP service
pub struct DocsService {
    tool_router: ToolRouter<DocsService>,
    cache: Arc<DocCache>,
}

impl std::fmt::Debug for DocsService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocsService")
            .field("docs", &self.cache.manifest().len())
            .finish()
    }
}

fn json_result<T: Serialize>(value: &T, fallback: &str) -> CallToolResult {
    let json = serde_json::to_string(value).unwrap_or_else(|e| {
        tracing::error!("MCP: failed to serialize tool result: {}", e);
        fallback.to_string()
    });
    CallToolResult::success(vec![Content::text(json)])
}

// === Tool Router Implementation ===

#[tool_router]
impl DocsService {
    pub fn new(cache: Arc<DocCache>) -> Self {
        Self {
            tool_router: Self::tool_router(),
            cache,
        }
    }

    #[tool(
        description = "Search the curated documentation set and return ranked results with snippets. Covers platform overviews, getting started guides, API references, tutorials, deployment and configuration guides, and troubleshooting. Returns a list of {url, title, score, snippet}; score is relevance in 0-1 (higher is better). Use fetch_doc with a returned url to read the full page."
    )]
    async fn search_docs(
        &self,
        Parameters(request): Parameters<SearchDocsRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!(
            "MCP search_docs: query='{}', k={:?}",
            request.query,
            request.k
        );
        let results = tools::search_docs(&self.cache, &request.query, request.k).await;
        tracing::debug!("MCP search_docs: {} results", results.len());
        Ok(json_result(&results, "[]"))
    }

    #[tool(
        description = "Fetch full document content by URL. Use this with URLs returned by search_docs (or documentation URLs provided directly) when a snippet is not enough: complete guides, API references, tutorials and configuration instructions. Returns {url, title, content}, or {error, url} if the page could not be fetched."
    )]
    async fn fetch_doc(
        &self,
        Parameters(request): Parameters<FetchDocRequest>,
    ) -> Result<CallToolResult, McpError> {
        tracing::debug!("MCP fetch_doc: uri='{}'", request.uri);
        let response = tools::fetch_doc(&self.cache, &request.uri).await;
        if response.is_error() {
            tracing::debug!("MCP fetch_doc: fetch failed for {}", request.uri);
        }
        let fallback = serde_json::json!({
            "error": crate::constants::FETCH_FAILED,
            "url": request.uri,
        })
        .to_string();
        Ok(json_result(&response, &fallback))
    }
}

#[tool_handler]
impl ServerHandler for DocsService {
    fn get_info(&self) -> ServerInfo {
        let docs = self.cache.manifest().len();

        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: rmcp::model::Implementation {
                name: APP_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                title: None,
                icons: None,
                website_url: None,
            },
            instructions: Some(format!(
                r#"docsearch - Documentation Search MCP Server

Searches a curated set of {docs} documentation pages and returns their content.
Pages are fetched lazily and cached for the lifetime of the server.

AVAILABLE TOOLS:

1. search_docs(query, k=5)
   Ranked search over the documentation set. Results come from page titles
   and, once pages have been fetched, from their body text as well.
   Returns: Array of {{url, title, score, snippet}}, best match first.

2. fetch_doc(uri)
   Full text of one page, usually a url returned by search_docs.
   Returns: {{url, title, content}} or {{error: "fetch failed", url}}.

RECOMMENDED WORKFLOW:

  1. search_docs("getting started")
  2. fetch_doc(<url of the best result>) when the snippet is not enough

A page that fails to fetch is not retried until the server restarts."#
            )),
            ..Default::default()
        }
    }
}

/// Run the MCP server on stdio until the transport closes or `cancel_token` fires
pub async fn run_mcp_server(cache: Arc<DocCache>, cancel_token: CancellationToken) -> Result<()> {
    use rmcp::{transport::stdio, ServiceExt};

    tracing::info!("🚀 Starting docsearch MCP server");
    tracing::info!("📚 Manifest: {} docs", cache.manifest().len());

    // Titles only, no network: keeps startup fast
    cache.ensure_ready().await;

    let service = DocsService::new(cache);
    let server = service.serve(stdio()).await?;

    tracing::info!("MCP server ready. Waiting for requests...");

    // Wait for shutdown: either MCP transport closes or cancellation token fires
    tokio::select! {
        result = server.waiting() => {
            tracing::info!("MCP server transport closed");
            result?;
        }
        _ = cancel_token.cancelled() => {
            tracing::info!("🛑 Shutdown signal received, stopping MCP server...");
        }
    }

    tracing::info!("✅ MCP server shut down cleanly");
    Ok(())
}
