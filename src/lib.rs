pub mod config;
pub mod db;
pub mod models;
pub mod pipeline;
pub mod storage;

use tracing_subscriber::EnvFilter;

/// Initialize tracing from RUST_LOG, falling back to the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
