//! Tracing subscriber setup
use tracing_subscriber::EnvFilter;

pub const DEFAULT_LOG_FILTER: &str = "loan_tracker_service=info,info";

/// Install the JSON tracing subscriber
///
/// Filter comes from `RUST_LOG`, falling back to [`DEFAULT_LOG_FILTER`].
/// Safe to call more than once; only the first call installs anything.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let installed = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .json()
        .try_init()
        .is_ok();

    if installed {
        tracing::debug!("Tracing initialized");
    }
}
