use std::env;
use std::process::Command;

fn git(args: &[&str], fallback: &str) -> String {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| fallback.to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/refs/heads");

    let cargo_version = env::var("CARGO_PKG_VERSION").unwrap_or_else(|_| "0.0.0".to_string());
    let commit_count = git(&["rev-list", "--count", "HEAD"], "0");
    let commit_hash = git(&["rev-parse", "--short", "HEAD"], "unknown");

    let version_full = format!("{}+{}", cargo_version, commit_count);

    println!("cargo:rustc-env=DOCSEARCH_COMMIT_HASH={}", commit_hash);
    println!("cargo:rustc-env=CARGO_PKG_VERSION_FULL={}", version_full);
}
