//! Log initialization: a plain `tracing-subscriber` setup with a
//! `RUST_LOG`-driven filter and a debug-vs-release default level.

use tracing_subscriber::{fmt, layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter};

/// Installs a global `tracing` subscriber reading `RUST_LOG`, defaulting to
/// `debug` in debug builds and `warn` in release ones. Safe to call more
/// than once per process (subsequent calls are no-ops) so tests can call it
/// from every case without tripping "subscriber already set".
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if cfg!(debug_assertions) { "debug" } else { "warn" }));

    let _ = tracing_subscriber::registry().with(filter).with(fmt::layer().with_target(true)).try_init();
}
