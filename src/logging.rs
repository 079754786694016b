// src/logging.rs
// Tracing setup for the CLI. Logs go to stderr so stdout stays pure JSON.

use tracing_subscriber::{fmt, EnvFilter};

// Installs a global subscriber. RUST_LOG wins when set; otherwise `warn`,
// or `debug` for this crate when verbose.
//
// Safe to call more than once: later calls are ignored.
pub fn init(verbose: bool) {
    let default = if verbose {
        "warn,repo_navigator=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
