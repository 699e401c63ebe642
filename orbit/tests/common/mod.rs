use orbit::Reactor;
use tracing_subscriber::EnvFilter;

/// Routes reactor logs to the test output, filtered by `RUST_LOG`.
#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// A reactor that leaves process signal dispositions untouched.
#[allow(dead_code)]
pub fn reactor() -> Reactor {
    init_tracing();
    Reactor::builder()
        .signals(false)
        .build()
        .expect("Failed to build reactor")
}
