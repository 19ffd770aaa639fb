use tracing_subscriber::{fmt, EnvFilter};
use tracing_subscriber::prelude::*;

/// Install the global subscriber. Filter comes from `RUST_LOG`, default `info`.
pub fn init() {
    init_with_default("info");
}

/// Like [`init`], with a different fallback filter (e.g. "gatekeeper=debug").
pub fn init_with_default(default_filter: &str) {
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}
