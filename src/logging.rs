use std::env;

use tracing_subscriber::{fmt::time::Uptime, EnvFilter};

/// Default directive when `RUST_LOG` is not set.
pub const DEFAULT_LOG_DIRECTIVE: &str = "info";

/// Install the global tracing subscriber.
///
/// - `rust_log`: used when `RUST_LOG` is unset; accepts the usual
///   `EnvFilter` syntax, e.g. `warn,image_boot_extract=debug`.
///
/// Events carry time elapsed since start rather than wall-clock time and go
/// to stderr; stdout is reserved for the report.
pub fn init_tracing(rust_log: &str) {
    let filter = match env::var("RUST_LOG") {
        Ok(directive) if !directive.is_empty() => EnvFilter::new(directive),
        _ => EnvFilter::new(rust_log),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_timer(Uptime::default())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
