// ABOUTME: Test support utilities.
// ABOUTME: Provides a recording transport and a local ping server.

use std::sync::Once;

// Each test binary only uses some of these modules, so allow dead_code.
#[allow(dead_code)]
pub mod ping_server;
#[allow(dead_code)]
pub mod recorder;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("healthping=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Every environment variable the config resolver reads.
pub const HEALTHCHECK_VARS: [&str; 3] = [
    "HEALTHCHECK_URL",
    "HEALTHCHECK_SEND_START",
    "HEALTHCHECK_SEND_DIAGNOSTICS",
];

/// Run `f` with all `HEALTHCHECK_*` variables unset.
#[allow(dead_code)]
pub fn without_healthcheck_env<R>(f: impl FnOnce() -> R) -> R {
    temp_env::with_vars_unset(HEALTHCHECK_VARS, f)
}
