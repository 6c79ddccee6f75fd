//! Tracing output for tests.
//!
//! Output goes through the libtest capture, so it only shows for failing
//! tests (or with `--nocapture`). Filter with `RUST_LOG`, e.g.
//! `RUST_LOG=opentok.archive=trace`.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Install a test subscriber once per process. Later calls are no-ops.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "opentok=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}
