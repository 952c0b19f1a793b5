//! Reactive synchronization layer for the fortune game client.
//!
//! Merges a one-shot filtered snapshot with an incremental push subscription
//! into a single reconciliation cache, derives epoch countdown and phase from
//! slot height, and watches for the resolved-game record after epoch end.
//! All state is rebuilt from the ledger on restart; nothing here persists.

pub mod cache;

pub mod clock;

pub mod finale;

pub mod ledger;

pub mod loader;

pub mod session;

pub mod stores;

pub type Result<T, E = anyhow::Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests;

pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}
