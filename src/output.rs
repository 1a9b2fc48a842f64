//! Console output for CLI commands
//!
//! Results go to stdout; informational chatter is suppressed with `--quiet`
//! or automatically when `--json` is requested.

use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};

static QUIET_MODE: AtomicBool = AtomicBool::new(false);

pub fn set_quiet(quiet: bool) {
    QUIET_MODE.store(quiet, Ordering::SeqCst);
}

pub fn is_quiet() -> bool {
    QUIET_MODE.load(Ordering::SeqCst)
}

pub fn print_info(args: std::fmt::Arguments<'_>) {
    if !is_quiet() {
        println!("{}", args);
    }
}

/// Pretty-printed JSON on stdout, always shown
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print a message only if not in quiet mode
#[macro_export]
macro_rules! info_print {
    ($($arg:tt)*) => {
        $crate::output::print_info(format_args!($($arg)*));
    };
}
