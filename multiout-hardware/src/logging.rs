//! Diagnostic output
//!
//! Every diagnostic of this crate is a `tracing` event. Applications that have
//! no subscriber of their own can install this one, which prefixes each line
//! with the time elapsed since start-up.

use tracing_subscriber::{fmt::time::Uptime, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when `RUST_LOG` is not set
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Install the global subscriber
///
/// Returns `false` if a subscriber was already installed.
pub fn init_tracing(verbose: bool) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_timer(Uptime::default()))
        .try_init()
        .is_ok()
}
