//! Context over the in-memory application with short timeouts

use std::sync::Arc;

use ftr_harness::fake::{FakeDashboards, FakeOptions};
use ftr_harness::{FtrConfig, FtrContext, TimeoutConfig};

pub fn fast_config() -> FtrConfig {
    FtrConfig {
        timeouts: TimeoutConfig {
            find_ms: 500,
            exists_ms: 50,
            try_ms: 2_000,
            wait_for_ms: 1_000,
            poll_interval_ms: 10,
        },
        ..Default::default()
    }
}

pub fn fake_context_with(config: FtrConfig, options: FakeOptions) -> (FtrContext, Arc<FakeDashboards>) {
    let app = Arc::new(FakeDashboards::with_options(&config.app, options));
    let settings = app.settings_store();
    let ctx = FtrContext::new(config, app.clone(), settings).unwrap();
    (ctx, app)
}

/// Pages take a couple of lookups to finish loading after each navigation.
pub fn fake_context() -> (FtrContext, Arc<FakeDashboards>) {
    fake_context_with(
        fast_config(),
        FakeOptions {
            loading_polls: 2,
            ..Default::default()
        },
    )
}
