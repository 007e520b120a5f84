//! Log output for the CLI
//!
//! Logs go to stderr so stdout only carries the lookup result. `RUST_LOG`
//! takes precedence over the level picked from `--verbose`.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Level used when `RUST_LOG` is unset
pub fn default_level(verbose: bool) -> &'static str {
    if verbose {
        "triples=debug"
    } else {
        "warn"
    }
}

/// Installs the global stderr subscriber
///
/// Does nothing if a subscriber is already installed.
pub fn init_logging(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level(verbose)));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    let _ = tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init();
}
