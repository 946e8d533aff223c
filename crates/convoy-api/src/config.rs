//! # Command Line & Environment
//!
//! Every flag falls back to an environment variable, so the binary runs
//! unchanged under a process supervisor or in a container.

use clap::Parser;
use convoy_core::{AllocationConfig, ValidationError, DEFAULT_ALLOCATION_WINDOW};

use crate::state::{AppConfig, LogFormat};

/// Convoy freight dispatch service.
#[derive(Debug, Parser)]
#[command(name = "convoy", version, about)]
pub struct Cli {
    /// Port to listen on.
    #[arg(long, env = "CONVOY_PORT", default_value_t = 8080)]
    pub port: u16,

    /// Maximum number of drivers offered each shipment.
    #[arg(long, env = "CONVOY_ALLOCATION_WINDOW", default_value_t = DEFAULT_ALLOCATION_WINDOW)]
    pub allocation_window: usize,

    /// Postgres connection string. Without it state lives in memory.
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,

    /// Log output format.
    #[arg(long, env = "CONVOY_LOG_FORMAT", value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,

    /// Register the built-in sample drivers on startup.
    #[arg(long)]
    pub seed_demo_drivers: bool,
}

impl Cli {
    /// Validate and resolve into the runtime configuration.
    pub fn into_config(self) -> Result<AppConfig, ValidationError> {
        Ok(AppConfig {
            port: self.port,
            allocation: AllocationConfig::new(self.allocation_window)?,
            database_url: self.database_url.filter(|url| !url.trim().is_empty()),
            log_format: self.log_format,
            seed_demo_drivers: self.seed_demo_drivers,
        })
    }
}
