//! Internal tracing setup

use tracing_subscriber::EnvFilter;

/// Filter directive in effect when `RUST_LOG` is unset
fn default_directive(verbose: bool, level: &str) -> &str {
    if verbose {
        "debug"
    } else if level.trim().is_empty() {
        "warn"
    } else {
        level
    }
}

/// Initialize tracing for bridge diagnostics
///
/// Call early in main() before any logging occurs. Output goes to stderr
/// so stdout stays free for the console sink. `RUST_LOG` wins over both
/// `verbose` and `level` (the `[logs] level` config value).
pub fn init_tracing(verbose: bool, level: &str) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_directive(verbose, level)))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_file(false)
                .compact(),
        )
        .with(filter)
        .try_init();
}
