//! Logger setup.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence. Without it, the binary named `name` and the
/// orchestration core log at `default_level`; everything else stays at `warn`.
///
/// Output goes to stderr so a terminal transcript on stdout is not interleaved
/// with log lines when stderr is redirected.
///
/// Calling this more than once is harmless; later calls are ignored.
pub fn setup_logger(name: &str, default_level: &str) {
    let crate_name = name.replace('-', "_");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,{crate_name}={default_level},huddle_core={default_level},huddle_client={default_level}"
        ))
    });

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_ansi(true),
        )
        .try_init();
}
