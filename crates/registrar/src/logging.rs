use tracing_subscriber::EnvFilter;

/// Initialize tracing to stderr, honoring RUST_LOG with an info default
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
