//! Diagnostic logging
//!
//! Everything goes to stderr; stdout is reserved for classification output.

use std::env;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Variable holding an `EnvFilter` directive string
pub const LOG_ENV: &str = "DELPHI_LOG";

/// Installs the global subscriber.
///
/// `verbose` raises the default level from `warn` to `debug`; an explicit
/// `DELPHI_LOG` always wins. Calling this twice is harmless.
pub fn init_logger(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let filter = env::var(LOG_ENV).unwrap_or_else(|_| default_filter.to_string());
    let filter_layer =
        EnvFilter::try_new(&filter).unwrap_or_else(|_| EnvFilter::new(default_filter));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(filter_layer)
        .try_init();
}
