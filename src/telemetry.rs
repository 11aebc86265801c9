// 📡 Logging setup shared by both binaries

use tracing_subscriber::{fmt, EnvFilter};

/// Install a fmt subscriber filtered by RUST_LOG (default: info for this crate)
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("grocery_planner=info,grocery_server=info,warn"));

    // a second call (tests, embedding) keeps the first subscriber
    let _ = fmt().with_env_filter(filter).with_target(false).try_init();
}
