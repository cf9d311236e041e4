use tracing_subscriber::EnvFilter;

/// Initializes tracing for general application use. The log level comes from
/// the RUST_LOG environment variable (e.g. RUST_LOG=rscheme=trace) and falls
/// back to "info" when unset.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

/// Initializes tracing for tests: trace level, output captured by the test
/// runner, initialized at most once per process.
#[cfg(test)]
pub fn init_test_logging() {
    static TRACING_INIT: std::sync::Once = std::sync::Once::new();
    TRACING_INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter("trace")
            .with_test_writer()
            .try_init()
            .ok();
    });
}
