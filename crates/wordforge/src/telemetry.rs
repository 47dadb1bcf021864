//! Tracing setup.

use std::sync::OnceLock;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,wordforge=debug";

/// Installs the global subscriber for a binary: an env filter from
/// `RUST_LOG` (falling back to [`DEFAULT_FILTER`]) and a fmt layer.
///
/// Does nothing if a global subscriber is already set.
pub fn init_tracing() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false);

    if tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        tracing::debug!("global tracing subscriber already set");
    }
}

static TEST_TRACING: OnceLock<()> = OnceLock::new();

/// Initializes logging for tests. Idempotent and race-safe.
///
/// Level precedence: `TEST_LOG`, then `RUST_LOG`, then `"warn"`. Output goes
/// through the test writer so the harness captures it per test.
pub fn init_test_tracing() {
    TEST_TRACING.get_or_init(|| {
        let filter = std::env::var("TEST_LOG")
            .or_else(|_| std::env::var("RUST_LOG"))
            .map(EnvFilter::new)
            .unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .try_init()
            .ok();
    });
}
