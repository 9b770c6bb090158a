//! Application configuration from file and environment variables
//!
//! Configuration is loaded with the following priority (highest to lowest):
//! 1. Environment variables (prefixed with POLLS_)
//! 2. Config file (config.toml)
//! 3. Default values
//!
//! Keys are single words because the environment separator is `_`,
//! e.g. `POLLS_DATABASE_URL` maps to `database.url`.

use config::{Config, ConfigError, Environment, File};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// Selects the in-memory repository instead of a database.
pub const MEMORY_DATABASE: &str = "memory";

/// Global application configuration
pub static APP_CONFIG: Lazy<AppConfig> = Lazy::new(|| {
    AppConfig::load().unwrap_or_else(|e| {
        log::warn!("Failed to load config file, using defaults: {}", e);
        AppConfig::default()
    })
});

/// Site configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub name: String,
    pub description: String,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            name: "Polls".to_string(),
            description: "Vote on the questions of the day".to_string(),
        }
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the listener binds to
    pub bind: String,
    /// Worker count, 0 lets actix pick one per core
    pub workers: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8080".to_string(),
            workers: 0,
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection URL (postgres:// or sqlite://) or "memory".
    /// Falls back to the DATABASE_URL env var when empty.
    pub url: String,
    /// Maximum pooled connections
    pub connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            connections: 10,
        }
    }
}

impl DatabaseConfig {
    /// Configured URL, then DATABASE_URL, then a local SQLite file.
    pub fn resolved_url(&self) -> String {
        if !self.url.is_empty() {
            return self.url.clone();
        }
        std::env::var("DATABASE_URL")
            .ok()
            .filter(|url| !url.is_empty())
            .unwrap_or_else(|| "sqlite://polls.db?mode=rwc".to_string())
    }

    pub fn is_memory(&self) -> bool {
        self.resolved_url() == MEMORY_DATABASE
    }
}

/// Admin area configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Number of choice inputs on the "Add poll" form
    pub slots: usize,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self { slots: 3 }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub site: SiteConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub admin: AdminConfig,
}

impl AppConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path("config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &str) -> Result<Self, ConfigError> {
        use config::FileFormat;

        let config = Config::builder()
            .add_source(config::Config::try_from(&AppConfig::default())?)
            .add_source(File::new(path, FileFormat::Toml).required(false))
            // e.g., POLLS_SERVER_BIND, POLLS_ADMIN_SLOTS
            .add_source(
                Environment::with_prefix("POLLS")
                    .separator("_")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

/// Initialize application configuration
///
/// Triggers the lazy load of the config file. Call early in startup.
pub fn init() {
    let config = get_config();
    log::info!("Configuration loaded: site.name = {}", config.site.name);
}

/// Get the current application configuration
pub fn get_config() -> AppConfig {
    APP_CONFIG.clone()
}

pub fn database() -> DatabaseConfig {
    get_config().database
}

pub fn admin() -> AdminConfig {
    get_config().admin
}
