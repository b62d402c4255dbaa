//! Centralised tracing initialisation for the pdkit binaries.
//!
//! Call [`init_tracing`] once at program start. Log lines go to stderr;
//! the agent-protocol binary owns stdout for its wire format.

use tracing::Level;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialise the global tracing subscriber.
///
/// Respects `RUST_LOG` for fine-grained filtering; falls back to the
/// supplied `level` when it is not set. Safe to call more than once;
/// subsequent calls are silently ignored.
pub fn init_tracing(level: Level) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .ok();
}
