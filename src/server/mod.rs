//! HTTP JSON API over the documentation cache
//!
//! Same two operations as the MCP tools, with identical response bodies,
//! for callers that do not speak MCP.

use anyhow::Result;
use axum::{
    extract::{Json, State},
    routing::{get, post},
    Router,
};
use colored::Colorize;
use serde::Serialize;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::docs::{DocCache, DocStats};
use crate::mcp::{self, FetchDocRequest, FetchDocResponse, SearchDocResult, SearchDocsRequest};

/// Health check response
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    docs: usize,
}

/// Build the HTTP router
pub fn router(cache: Arc<DocCache>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/stats", get(stats_handler))
        .route("/search", post(search_handler))
        .route("/fetch", post(fetch_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(cache)
}

/// Serve the HTTP API on 127.0.0.1:`port` until `cancel_token` fires
pub async fn serve(cache: Arc<DocCache>, port: u16, cancel_token: CancellationToken) -> Result<()> {
    println!("{}", "🚀 docsearch server".bright_cyan().bold());
    println!("{}", "=".repeat(60));
    println!("📚 Docs: {}", cache.manifest().len());
    println!("🌐 Port: {}", port);

    cache.ensure_ready().await;
    let app = router(cache);

    let addr = format!("127.0.0.1:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    println!("\n{}", "🌐 Server ready!".bright_green().bold());
    println!("  Health: http://{}/health", addr);
    println!("  Stats:  http://{}/stats", addr);
    println!("  Search: POST http://{}/search {{\"query\": ..., \"k\": 5}}", addr);
    println!("  Fetch:  POST http://{}/fetch {{\"uri\": ...}}", addr);
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { cancel_token.cancelled().await })
        .await?;

    tracing::info!("✅ HTTP server shut down cleanly");
    Ok(())
}

// HTTP Handlers

async fn health_handler(State(cache): State<Arc<DocCache>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        docs: cache.manifest().len(),
    })
}

async fn stats_handler(State(cache): State<Arc<DocCache>>) -> Json<DocStats> {
    Json(cache.stats().await)
}

async fn search_handler(
    State(cache): State<Arc<DocCache>>,
    Json(req): Json<SearchDocsRequest>,
) -> Json<Vec<SearchDocResult>> {
    let start = std::time::Instant::now();
    let results = mcp::search_docs(&cache, &req.query, req.k).await;
    tracing::debug!(
        "POST /search '{}': {} results in {}ms",
        req.query,
        results.len(),
        start.elapsed().as_millis()
    );
    Json(results)
}

async fn fetch_handler(
    State(cache): State<Arc<DocCache>>,
    Json(req): Json<FetchDocRequest>,
) -> Json<FetchDocResponse> {
    Json(mcp::fetch_doc(&cache, &req.uri).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::StaticFetcher;
    use crate::manifest::{Manifest, ManifestEntry};
    use crate::url_validator::UrlValidator;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    fn app() -> Router {
        let manifest = Manifest::new(vec![
            ManifestEntry {
                uri: "https://x/a".into(),
                display_title: "Getting Started".into(),
            },
            ManifestEntry {
                uri: "https://x/b".into(),
                display_title: "Runtime Limits".into(),
            },
        ]);
        let validator = UrlValidator::from_origins(manifest.uris());
        let fetcher = StaticFetcher::new().with_page("https://x/a", "Getting Started", "Install it.");
        router(Arc::new(DocCache::new(manifest, Arc::new(fetcher), validator)))
    }

    async fn call(app: Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null))
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = call(app(), Request::get("/health").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["docs"], 2);
    }

    #[tokio::test]
    async fn test_search() {
        let (status, body) = call(
            app(),
            post_json("/search", serde_json::json!({"query": "getting started"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let results = body.as_array().unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!(results[0]["url"], "https://x/a");
        assert_eq!(results[0]["snippet"], "Install it.");
    }

    #[tokio::test]
    async fn test_fetch_failure_shape() {
        let (status, body) = call(
            app(),
            post_json("/fetch", serde_json::json!({"uri": "https://x/b"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, serde_json::json!({"error": "fetch failed", "url": "https://x/b"}));
    }

    #[tokio::test]
    async fn test_stats_before_ready() {
        let (_, body) = call(app(), Request::get("/stats").body(Body::empty()).unwrap()).await;
        assert_eq!(body["ready"], false);
        assert_eq!(body["fetched"], 0);
        assert_eq!(body["hit_rate"], 0.0);
    }

    #[tokio::test]
    async fn test_bad_request_body_rejected() {
        let (status, _) = call(app(), post_json("/search", serde_json::json!({"k": 3}))).await;
        assert!(status.is_client_error());
    }
}
