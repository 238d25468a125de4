//! Diagnostic logging via `tracing`.
//!
//! Console status lines go through [`crate::output`]; this is the separate,
//! filterable diagnostic channel. Both write to stderr.
//!
//! Level priority: `RUST_LOG` > `--debug` > [`DEFAULT_LOG_LEVEL`].

use tracing_subscriber::EnvFilter;

/// Filter used when neither `RUST_LOG` nor `--debug` is given.
pub const DEFAULT_LOG_LEVEL: &str = "warn";

/// Pick the filter directive for this run.
#[must_use]
pub fn filter_directive(rust_log: Option<&str>, debug_flag: bool) -> String {
    match rust_log {
        Some(directive) if !directive.trim().is_empty() => directive.to_string(),
        _ if debug_flag => "profsnap=debug".to_string(),
        _ => DEFAULT_LOG_LEVEL.to_string(),
    }
}

/// Install the global subscriber. Call once, before any work starts.
pub fn init(debug_flag: bool) {
    let rust_log = std::env::var("RUST_LOG").ok();
    let filter = EnvFilter::try_new(filter_directive(rust_log.as_deref(), debug_flag))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_LEVEL));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(debug_flag)
        .compact()
        .try_init();

    tracing::debug!(version = crate::VERSION, "logging initialised");
}
