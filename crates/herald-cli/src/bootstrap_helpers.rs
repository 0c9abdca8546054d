use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

/// Compact logging filtered by `RUST_LOG`.
pub(crate) fn init_tracing() {
    // Skip, withhold and deletion decisions are logged at `info`; a CI run
    // should show them without setting `RUST_LOG`.
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
