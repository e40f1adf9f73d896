//! Logging setup for the telecontrol node.
//!
//! The subscriber is installed thread-locally so it does not fight with the
//! global subscriber dora installs for its own runtime.

use tracing::subscriber::DefaultGuard;
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info";

/// Install a thread-local subscriber honouring `RUST_LOG`.
///
/// Keep the returned guard alive for as long as the node runs:
///
/// ```no_run
/// use telecontrol_lib::init_tracing;
///
/// let _guard = init_tracing();
/// ```
pub fn init_tracing() -> DefaultGuard {
    use tracing_subscriber::layer::SubscriberExt;

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_file(false)
        .with_line_number(false);

    let subscriber = tracing_subscriber::Registry::default()
        .with(env_filter)
        .with(fmt_layer);

    tracing::subscriber::set_default(subscriber)
}
