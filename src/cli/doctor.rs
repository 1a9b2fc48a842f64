use anyhow::Result;
use colored::Colorize;

use crate::config::Config;
use crate::constants::get_cache_dir;
use crate::docs::DocCache;
use crate::logger::{ensure_log_dir, get_log_dir};

struct Report {
    failures: usize,
}

impl Report {
    fn pass(&self, msg: impl AsRef<str>) {
        println!("  {} {}", "✅".green(), msg.as_ref());
    }

    fn warn(&self, msg: impl AsRef<str>) {
        println!("  {} {}", "⚠️ ".yellow(), msg.as_ref());
    }

    fn fail(&mut self, msg: impl AsRef<str>) {
        self.failures += 1;
        println!("  {} {}", "❌".red(), msg.as_ref());
    }
}

pub async fn run(config: &Config, online: bool) -> Result<()> {
    println!("🔍 Checking docsearch installation...");
    let mut report = Report { failures: 0 };

    report.pass(format!(
        "Config: timeout={}s, concurrency={}",
        config.fetch_timeout_secs, config.fetch_concurrency
    ));

    let manifest = match config.load_manifest() {
        Ok(manifest) => {
            let source = config
                .manifest_path
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in".to_string());
            report.pass(format!("Manifest ({}): {} documents", source, manifest.len()));
            Some(manifest)
        }
        Err(e) => {
            report.fail(format!("Manifest: {}", e));
            None
        }
    };

    if let Some(manifest) = &manifest {
        let validator = config.url_validator(manifest);
        if validator.is_permissive() {
            report.warn("Allow-list is empty: any http(s) URL can be fetched");
        } else {
            let prefixes: Vec<&str> = validator
                .allowed_domain_prefixes()
                .iter()
                .map(String::as_str)
                .collect();
            report.pass(format!("Allowed domains: {}", prefixes.join(", ")));
        }

        let uris: Vec<String> = manifest.uris().map(str::to_string).collect();
        match validator.validate_urls(&uris) {
            Ok(_) => report.pass("Every manifest URL is inside the allow-list"),
            Err(e) => report.fail(e.to_string()),
        }
    }

    let base_dir = get_cache_dir();
    match ensure_log_dir(&base_dir) {
        Ok(()) => report.pass(format!("Log directory: {}", get_log_dir(&base_dir).display())),
        Err(e) => report.fail(format!("Log directory {}: {}", base_dir.display(), e)),
    }

    if online {
        match (&manifest, DocCache::from_config(config)) {
            (Some(manifest), Ok(cache)) => match manifest.uris().next() {
                Some(uri) => match cache.ensure_page(uri).await {
                    Some(page) => report.pass(format!(
                        "Fetched {} ({} chars)",
                        uri,
                        page.content.chars().count()
                    )),
                    None => report.fail(format!("Could not fetch {}", uri)),
                },
                None => report.warn("Manifest is empty, nothing to fetch"),
            },
            (_, Err(e)) => report.fail(format!("HTTP client: {}", e)),
            (None, Ok(_)) => {}
        }
    }

    if report.failures > 0 {
        return Err(anyhow::anyhow!("{} check(s) failed", report.failures));
    }
    println!("✅ All checks passed!");
    Ok(())
}
