//! # Application State
//!
//! Shared state handed to every handler: the dispatcher over the store
//! backend chosen at startup, and the resolved configuration.

use convoy_core::AllocationConfig;
use convoy_dispatch::Dispatcher;
use convoy_store::{AnyStore, MemoryStore};

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    /// Human-readable lines.
    #[default]
    Text,
    /// One JSON object per event.
    Json,
}

/// Resolved runtime configuration.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Allocator tunables.
    pub allocation: AllocationConfig,
    /// Postgres connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub log_format: LogFormat,
    /// Register the sample drivers on startup.
    pub seed_demo_drivers: bool,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("allocation", &self.allocation)
            .field("database_url", &self.database_url.as_ref().map(|_| "[REDACTED]"))
            .field("log_format", &self.log_format)
            .field("seed_demo_drivers", &self.seed_demo_drivers)
            .finish()
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            allocation: AllocationConfig::default(),
            database_url: None,
            log_format: LogFormat::Text,
            seed_demo_drivers: false,
        }
    }
}

/// Shared handler state. Cloning is cheap.
#[derive(Debug, Clone)]
pub struct AppState {
    pub dispatcher: Dispatcher<AnyStore>,
    pub config: AppConfig,
}

impl AppState {
    /// Default configuration over a fresh in-memory store.
    pub fn new() -> Self {
        Self::with_store(MemoryStore::new().into(), AppConfig::default())
    }

    pub fn with_store(store: AnyStore, config: AppConfig) -> Self {
        Self {
            dispatcher: Dispatcher::new(store, config.allocation),
            config,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}
