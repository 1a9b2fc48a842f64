pub mod cache;
pub mod cli;
pub mod config;
pub mod constants;
pub mod docs;
pub mod error;
pub mod fetch;
pub mod index;
pub mod logger;
pub mod manifest;
pub mod mcp;
pub mod output;
pub mod server;
pub mod text;
pub mod url_validator;
pub mod utils;

// Re-export commonly used types
pub use cache::{CacheStats, PageState, PageStore};
pub use config::Config;
pub use docs::{DocCache, DocStats};
pub use error::{DocSearchError, Result as DsResult};
pub use fetch::{HttpFetcher, Page, PageFetcher};
pub use index::{Doc, DocIndex, ScoredDoc};
pub use manifest::{Manifest, ManifestEntry};
pub use mcp::{FetchDocResponse, SearchDocResult};
pub use url_validator::UrlValidator;
