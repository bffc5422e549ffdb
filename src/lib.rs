//! DentSync — dental clinic records with cross-session synchronization.
//!
//! All state lives in a shared key-value store; every open [`session::Session`]
//! keeps an in-memory mirror that is updated through three channels: direct
//! change notices from the store, a persisted cross-session event relay, and
//! a periodic reconciliation loop that repairs anything the first two missed.

pub mod auth;
pub mod clinic;
pub mod config;
pub mod events;
pub mod models;
pub mod notifications;
pub mod reconcile;
pub mod relay;
pub mod seed;
pub mod session;
pub mod store;
pub mod toast;

use tracing_subscriber::EnvFilter;

/// Initialize tracing from `RUST_LOG`, falling back to the built-in filter.
pub fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER)),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
