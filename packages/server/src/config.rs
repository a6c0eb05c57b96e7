use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::StorageConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    /// Allowed origins. Empty disables cross-origin access.
    #[serde(default)]
    pub allow_origins: Vec<String>,
    /// Preflight cache lifetime in seconds. Default: 3600.
    #[serde(default = "default_cors_max_age")]
    pub max_age: u64,
}

fn default_cors_max_age() -> u64 {
    3600
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allow_origins: Vec::new(),
            max_age: default_cors_max_age(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    /// Connection URL, e.g. `sqlite://cookbook.db?mode=rwc` or `postgres://...`.
    pub url: String,
    /// Connection pool size. Default: 10.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    10
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("COOKBOOK_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("database.url", "sqlite://cookbook.db?mode=rwc")?
            .set_default("storage.dir", "./instance/images")?
            // Load from config/config.toml
            .add_source(File::with_name(&config_path).required(false))
            // Override from environment (e.g., COOKBOOK__DATABASE__URL)
            .add_source(Environment::with_prefix("COOKBOOK").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
