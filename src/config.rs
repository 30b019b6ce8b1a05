use std::env;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use serde::Deserialize;

use crate::store::StoreConfig;

/// Top-level application configuration loaded from file + environment.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub store: StoreSection,
    pub logging: LoggingSection,
}

impl AppConfig {
    /// Load configuration from disk and environment.
    pub fn load() -> Result<Self> {
        let config_path =
            env::var("TODO_API_CONFIG").unwrap_or_else(|_| "config.toml".to_string());
        Self::load_from(Path::new(&config_path))
    }

    /// Load configuration from `path` (skipped if missing) and environment.
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut builder = config::Config::builder();

        if path.exists() {
            builder = builder.add_source(config::File::from(PathBuf::from(path)));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("TODO_API")
                .separator("_")
                .try_parsing(true),
        );

        let settings = builder.build()?;
        let mut config: Self = settings.try_deserialize()?;

        // Conventional variables used by most hosting platforms
        if env::var("TODO_API_SERVER_PORT").is_err() {
            if let Ok(port) = env::var("PORT") {
                config.server.port = port
                    .trim()
                    .parse()
                    .map_err(|e| anyhow::anyhow!("invalid PORT '{}': {}", port, e))?;
            }
        }
        if config.store.uri.is_none() {
            config.store.uri = env::var("MONGO_URI").ok().filter(|u| !u.trim().is_empty());
        }

        if config.logging.level.trim().is_empty() {
            config.logging.level = "info".to_string();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            bail!("server.port must be non-zero");
        }
        Ok(())
    }

    /// Resolve store configuration.
    pub fn store_runtime(&self) -> StoreConfig {
        self.store.to_runtime()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct StoreSection {
    pub backend: StoreBackendKind,
    /// MongoDB connection string
    pub uri: Option<String>,
    /// Overrides the database named in `uri`
    pub database: Option<String>,
}

impl StoreSection {
    pub fn to_runtime(&self) -> StoreConfig {
        match self.backend {
            StoreBackendKind::Mongodb => StoreConfig::Mongo {
                uri: trimmed(self.uri.as_deref()),
                database: trimmed(self.database.as_deref()),
            },
            StoreBackendKind::Memory => StoreConfig::Memory,
        }
    }
}

fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackendKind {
    #[default]
    Mongodb,
    Memory,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct LoggingSection {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Json,
    Text,
}
