#![forbid(unsafe_code)]

//! Subscriber setup for the binary.
//!
//! Filtering follows `RUST_LOG` and defaults to warnings only, so normal
//! command output on stdout stays clean while placement fallbacks, legacy
//! migrations and failed saves still show up on stderr.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "warn";

#[must_use]
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber. A second call is a no-op.
pub fn init(json: bool) {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_writer(std::io::stderr)
        .with_target(true);
    let installed = if json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    if installed.is_ok() {
        tracing::debug!(target: "floorplan.cli", json, "tracing initialized");
    }
}
