//! Central constants for docsearch configuration
//!
//! Defaults for fetching, ranking, snippets and logging live here so the
//! config layer, the CLI and the tests agree on the same values.

use std::sync::atomic::AtomicBool;

/// Set on the first CTRL-C; a second CTRL-C forces exit
pub static SHUTDOWN_REQUESTED: AtomicBool = AtomicBool::new(false);

/// Name used for the MCP server info, log files and the cache directory
pub const APP_NAME: &str = "docsearch";

/// Default number of results returned by `search_docs`
pub const DEFAULT_SEARCH_K: usize = 5;

/// Upper bound on `k` accepted from callers
pub const MAX_SEARCH_RESULTS: usize = 50;

/// Most never-fetched docs one search may hydrate beyond its preview hits
pub const MAX_BACKFILL_PER_SEARCH: usize = 5;

/// Per-fetch timeout in seconds; a timeout counts as a failed fetch
pub const DEFAULT_FETCH_TIMEOUT_SECS: u64 = 10;

/// Maximum number of page fetches in flight while hydrating search results
pub const DEFAULT_FETCH_CONCURRENCY: usize = 8;

/// Pages larger than this are truncated before text extraction
pub const MAX_PAGE_BYTES: usize = 4 * 1024 * 1024;

/// Maximum snippet length in characters (ellipsis excluded)
pub const SNIPPET_MAX_CHARS: usize = 300;

/// Characters of context kept before the first query match in a snippet
pub const SNIPPET_LEAD_CHARS: usize = 60;

/// Shown when neither page content nor a title is available
pub const NO_PREVIEW: &str = "No preview available";

/// Error string surfaced by `fetch_doc` when a page cannot be retrieved
pub const FETCH_FAILED: &str = "fetch failed";

/// Ranking weights; they sum to 1.0 so scores stay in [0, 1]
pub const TITLE_COVERAGE_WEIGHT: f32 = 0.6;
pub const TITLE_PHRASE_WEIGHT: f32 = 0.1;
pub const BODY_WEIGHT: f32 = 0.3;

/// Term-frequency saturation constant for body matches
pub const BODY_TF_SATURATION: f32 = 1.2;

/// Default HTTP port for `docsearch serve`
pub const DEFAULT_SERVE_PORT: u16 = 4455;

/// Log directory name (inside the cache directory)
pub const LOG_DIR_NAME: &str = "logs";

/// Log file name prefix for the rolling appender
pub const LOG_FILE_NAME: &str = "docsearch.log";

/// Days of logs kept by the cleanup task
pub const DEFAULT_LOG_RETENTION_DAYS: u64 = 7;

/// Maximum number of rotated log files kept
pub const DEFAULT_LOG_MAX_FILES: usize = 10;

/// Environment variables
pub const ENV_CONFIG: &str = "DOCSEARCH_CONFIG";
pub const ENV_MANIFEST: &str = "DOCSEARCH_MANIFEST";
pub const ENV_ALLOWED_DOMAINS: &str = "DOCSEARCH_ALLOWED_DOMAINS";
pub const ENV_FETCH_TIMEOUT_SECS: &str = "DOCSEARCH_FETCH_TIMEOUT_SECS";
pub const ENV_FETCH_CONCURRENCY: &str = "DOCSEARCH_FETCH_CONCURRENCY";
pub const ENV_USER_AGENT: &str = "DOCSEARCH_USER_AGENT";
pub const ENV_LOG_RETENTION_DAYS: &str = "DOCSEARCH_LOG_RETENTION_DAYS";
pub const ENV_LOG_MAX_FILES: &str = "DOCSEARCH_LOG_MAX_FILES";
pub const ENV_LOG_CLEANUP_INTERVAL_HOURS: &str = "DOCSEARCH_LOG_CLEANUP_INTERVAL_HOURS";

/// Default User-Agent for page fetches
pub fn default_user_agent() -> String {
    format!("{}/{}", APP_NAME, env!("CARGO_PKG_VERSION"))
}

/// Cache directory for logs: `<platform cache dir>/docsearch`
///
/// Falls back to `./.docsearch` when the platform has no cache directory.
pub fn get_cache_dir() -> std::path::PathBuf {
    dirs::cache_dir()
        .map(|d| d.join(APP_NAME))
        .unwrap_or_else(|| std::path::PathBuf::from(format!(".{}", APP_NAME)))
}

/// Built-in manifest used when none is configured
///
/// Keeps the server usable out of the box; real deployments point
/// `--manifest` at their own curated list.
pub const BUILTIN_MANIFEST: &[(&str, &str)] = &[
    (
        "https://modelcontextprotocol.io/docs/getting-started/intro",
        "What is the Model Context Protocol (MCP)?",
    ),
    (
        "https://modelcontextprotocol.io/docs/learn/architecture",
        "MCP Architecture Overview",
    ),
    (
        "https://modelcontextprotocol.io/docs/learn/server-concepts",
        "Understanding MCP Servers",
    ),
    (
        "https://modelcontextprotocol.io/docs/learn/client-concepts",
        "Understanding MCP Clients",
    ),
    (
        "https://modelcontextprotocol.io/docs/develop/build-server",
        "Build an MCP Server",
    ),
    (
        "https://modelcontextprotocol.io/docs/develop/build-client",
        "Build an MCP Client",
    ),
    (
        "https://modelcontextprotocol.io/docs/tools/debugging",
        "Debugging MCP Servers",
    ),
    (
        "https://modelcontextprotocol.io/specification/2025-06-18/server/tools",
        "Specification: Tools",
    ),
];
