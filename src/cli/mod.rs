use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use colored::Colorize;
use futures::stream::{self, StreamExt};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::constants::{get_cache_dir, DEFAULT_SEARCH_K, DEFAULT_SERVE_PORT, MAX_SEARCH_RESULTS};
use crate::docs::DocCache;
use crate::info_print;
use crate::logger::LogLevel;
use crate::mcp::{self, FetchDocResponse};
use crate::output::print_json;

/// Documentation search and fetch server for AI assistants
#[derive(Parser, Debug)]
#[command(name = "docsearch")]
#[command(author, version = env!("CARGO_PKG_VERSION_FULL"), about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(short = 'l', long, global = true, default_value = "info")]
    pub loglevel: String,

    /// Suppress informational output (only show results/errors)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// YAML config file (overrides DOCSEARCH_CONFIG)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Manifest file listing the documents (JSON or YAML)
    #[arg(short, long, global = true)]
    pub manifest: Option<PathBuf>,

    /// Allowed domain prefix for fetches (repeatable), e.g. https://docs.example.com
    #[arg(long = "allow-domain", global = true)]
    pub allowed_domains: Vec<String>,

    /// Per-page fetch timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Maximum concurrent page fetches
    #[arg(long, global = true)]
    pub concurrency: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the MCP server on stdio
    Mcp,

    /// Run the HTTP JSON API
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_SERVE_PORT)]
        port: u16,
    },

    /// Search the documentation set
    Search {
        /// Search query (e.g., "getting started")
        query: String,

        /// Maximum number of results
        #[arg(short, default_value_t = DEFAULT_SEARCH_K)]
        k: usize,

        /// Output JSON for agents
        #[arg(long)]
        json: bool,
    },

    /// Fetch the full text of one document
    Fetch {
        /// Document URL
        uri: String,

        /// Output JSON for agents
        #[arg(long)]
        json: bool,
    },

    /// Fetch every manifest document once and report failures
    Warm,

    /// List the documents in the manifest
    Manifest {
        /// Output JSON
        #[arg(long)]
        json: bool,
    },

    /// Check configuration, manifest and allow-list
    Doctor {
        /// Also fetch the first manifest document
        #[arg(long)]
        online: bool,
    },
}

impl Cli {
    /// Config file and environment, then command-line flags on top
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(self.config.as_deref())?;
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }

    fn apply_overrides(&self, config: &mut Config) {
        if let Some(manifest) = &self.manifest {
            config.manifest_path = Some(manifest.clone());
        }
        if !self.allowed_domains.is_empty() {
            config.allowed_domains = self.allowed_domains.clone();
        }
        if let Some(timeout) = self.timeout {
            config.fetch_timeout_secs = timeout;
        }
        if let Some(concurrency) = self.concurrency {
            config.fetch_concurrency = concurrency;
        }
    }
}

/// Whether `args` invoke `mcp` or `serve`, which install their own file logger
///
/// Looks at the parsed subcommand, so `docsearch search mcp` does not count.
pub fn is_long_running(args: &[String]) -> bool {
    Cli::command()
        .try_get_matches_from(args)
        .map(|m| matches!(m.subcommand_name(), Some("mcp" | "serve")))
        .unwrap_or(false)
}

pub async fn run(cancel_token: CancellationToken) -> Result<()> {
    let cli = Cli::parse();

    if cli.quiet {
        crate::output::set_quiet(true);
    }

    let log_level = LogLevel::parse(&cli.loglevel).unwrap_or_default();
    let config = cli.load_config()?;

    match cli.command {
        Commands::Mcp => {
            // NOTE: tracing is not initialized in main.rs for mcp/serve;
            // this is the first and only global subscriber
            start_file_logging(log_level, cli.quiet, &cancel_token);
            let cache = Arc::new(DocCache::from_config(&config)?);
            mcp::run_mcp_server(cache, cancel_token).await
        }
        Commands::Serve { port } => {
            start_file_logging(log_level, cli.quiet, &cancel_token);
            let cache = Arc::new(DocCache::from_config(&config)?);
            crate::server::serve(cache, port, cancel_token).await
        }
        Commands::Search { query, k, json } => {
            if json {
                crate::output::set_quiet(true);
            }
            let cache = DocCache::from_config(&config)?;
            search(&cache, &query, k, json).await
        }
        Commands::Fetch { uri, json } => {
            if json {
                crate::output::set_quiet(true);
            }
            let cache = DocCache::from_config(&config)?;
            fetch(&cache, &uri, json).await
        }
        Commands::Warm => {
            let cache = DocCache::from_config(&config)?;
            warm(&cache, &config, cancel_token).await
        }
        Commands::Manifest { json } => {
            let manifest = config.load_manifest()?;
            if json {
                return print_json(&manifest);
            }
            info_print!("{}", format!("📚 {} documents", manifest.len()).bold());
            for entry in &manifest.docs {
                println!("{}  {}", entry.display_title, entry.uri.dimmed());
            }
            Ok(())
        }
        Commands::Doctor { online } => doctor::run(&config, online).await,
    }
}

fn start_file_logging(log_level: LogLevel, quiet: bool, cancel_token: &CancellationToken) {
    let base_dir = get_cache_dir();
    match crate::logger::init_logger(&base_dir, log_level, quiet) {
        Ok((_, retention)) => {
            crate::logger::start_cleanup_task(base_dir, retention, cancel_token.clone());
        }
        Err(e) => eprintln!("Warning: Failed to initialize file logger: {}", e),
    }
}

async fn search(cache: &DocCache, query: &str, k: usize, json: bool) -> Result<()> {
    if k > MAX_SEARCH_RESULTS {
        info_print!(
            "{}",
            format!("k capped at {}", MAX_SEARCH_RESULTS).yellow()
        );
    }
    let start = std::time::Instant::now();
    let results = mcp::search_docs(cache, query, Some(k)).await;

    if json {
        return print_json(&results);
    }

    if results.is_empty() {
        println!("No results for '{}'", query);
        return Ok(());
    }

    info_print!(
        "{}",
        format!(
            "🔍 {} results for '{}' ({}ms)\n",
            results.len(),
            query,
            start.elapsed().as_millis()
        )
        .bold()
    );
    for (i, r) in results.iter().enumerate() {
        println!(
            "{}. {} {}",
            i + 1,
            r.title.bright_cyan().bold(),
            format!("({:.3})", r.score).dimmed()
        );
        println!("   {}", r.url.dimmed());
        println!("   {}\n", r.snippet);
    }
    Ok(())
}

async fn fetch(cache: &DocCache, uri: &str, json: bool) -> Result<()> {
    let response = mcp::fetch_doc(cache, uri).await;
    if json {
        return print_json(&response);
    }
    match response {
        FetchDocResponse::Success {
            url,
            title,
            content,
        } => {
            info_print!("{}", title.bright_cyan().bold());
            info_print!("{}\n", url.dimmed());
            println!("{}", content);
            Ok(())
        }
        FetchDocResponse::Error { error, url } => Err(anyhow::anyhow!("{}: {}", error, url)),
    }
}

async fn warm(cache: &DocCache, config: &Config, cancel_token: CancellationToken) -> Result<()> {
    let uris: Vec<String> = cache.manifest().uris().map(str::to_string).collect();
    info_print!(
        "🔥 Fetching {} documents ({} at a time)...",
        uris.len(),
        config.fetch_concurrency
    );

    let pb = ProgressBar::new(uris.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );
    if crate::output::is_quiet() {
        pb.set_draw_target(indicatif::ProgressDrawTarget::hidden());
    }

    let mut failed: Vec<String> = Vec::new();
    let mut pages = stream::iter(uris.iter())
        .map(|uri| async move { (uri, cache.ensure_page(uri).await.is_some()) })
        .buffer_unordered(config.fetch_concurrency);

    loop {
        tokio::select! {
            next = pages.next() => {
                let Some((uri, ok)) = next else { break };
                if !ok {
                    failed.push(uri.clone());
                }
                pb.set_message(uri.clone());
                pb.inc(1);
            }
            _ = cancel_token.cancelled() => {
                pb.abandon_with_message("cancelled");
                return Ok(());
            }
        }
    }
    pb.finish_and_clear();

    let stats = cache.stats().await;
    info_print!(
        "{}",
        format!(
            "✅ {} fetched, {} failed ({} docs hydrated, {:.0}% cache hits)",
            stats.fetched,
            stats.failed,
            stats.hydrated,
            stats.hit_rate * 100.0
        )
        .bright_green()
    );
    for uri in &failed {
        println!("  {} {}", "✗".red(), uri);
    }
    if !failed.is_empty() {
        return Err(anyhow::anyhow!("{} documents failed to fetch", failed.len()));
    }
    Ok(())
}

mod doctor;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from(["docsearch", "search", "getting started", "-k", "3", "--json"])
            .unwrap();
        match cli.command {
            Commands::Search { query, k, json } => {
                assert_eq!(query, "getting started");
                assert_eq!(k, 3);
                assert!(json);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "docsearch",
            "fetch",
            "https://x/a",
            "--allow-domain",
            "https://x",
            "--allow-domain",
            "https://y",
            "--timeout",
            "3",
        ])
        .unwrap();
        assert_eq!(cli.allowed_domains, vec!["https://x", "https://y"]);
        assert_eq!(cli.timeout, Some(3));
    }

    #[test]
    fn test_flags_override_invalid_env_before_validation() {
        let mut config = Config::default();
        config
            .apply_env(|key| (key == "DOCSEARCH_FETCH_CONCURRENCY").then(|| "0".to_string()))
            .unwrap();
        assert!(config.validate().is_err());

        let cli = Cli::try_parse_from(["docsearch", "warm", "--concurrency", "4"]).unwrap();
        cli.apply_overrides(&mut config);
        config.validate().unwrap();
        assert_eq!(config.fetch_concurrency, 4);
    }

    #[test]
    fn test_long_running_detected_from_subcommand() {
        let args = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert!(is_long_running(&args(&["docsearch", "mcp"])));
        assert!(is_long_running(&args(&["docsearch", "-l", "debug", "serve", "-p", "8080"])));
        assert!(!is_long_running(&args(&["docsearch", "search", "mcp"])));
        assert!(!is_long_running(&args(&["docsearch", "fetch", "serve"])));
        assert!(!is_long_running(&args(&["docsearch", "--manifest", "mcp", "warm"])));
        assert!(!is_long_running(&args(&["docsearch", "--help"])));
    }

    #[test]
    fn test_serve_default_port() {
        let cli = Cli::try_parse_from(["docsearch", "serve"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { port } if port == DEFAULT_SERVE_PORT));
    }
}
