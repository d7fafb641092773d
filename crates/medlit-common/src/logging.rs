//! Tracing setup shared by binaries and integration tests.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Install the global fmt subscriber. Safe to call more than once; later
/// calls are no-ops.
pub fn init_tracing() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
