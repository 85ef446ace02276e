//! Layered server configuration.
//!
//! Sources, highest priority first:
//! 1. `TASKBOARD_*` environment variables, `__` separating sections
//!    (`TASKBOARD_SERVER__PORT=8080` -> `server.port`)
//! 2. `REDIS_URL`, as a shortcut for `redis.url`
//! 3. a TOML file (`taskboard.toml` in the working directory, or `--config`)
//! 4. built-in defaults

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

const DEFAULT_CONFIG_FILE: &str = "taskboard.toml";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
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

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RedisConfig {
    pub url: String,
    /// Prepended to every key the server writes.
    pub key_prefix: String,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: "taskboard:".to_string(),
        }
    }
}

/// Default page sizes for list endpoints. Zero means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct QueryConfig {
    pub task_limit: usize,
    pub user_limit: usize,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            task_limit: 100,
            user_limit: 0,
        }
    }
}

impl Config {
    /// Loads `.env`, then every configuration layer.
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        let config: Self = Self::figment(config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn figment(config_file: Option<&Path>) -> Figment {
        let path = config_file.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), Path::to_path_buf);

        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(path))
            .merge(Env::raw().only(&["REDIS_URL"]).map(|_| "redis.url".into()))
            .merge(Env::prefixed("TASKBOARD_").split("__"))
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "server.host".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        let scheme_ok = ["redis://", "rediss://", "unix://", "redis+unix://"]
            .iter()
            .any(|scheme| self.redis.url.starts_with(scheme));
        if !scheme_ok {
            return Err(ConfigError::InvalidValue {
                field: "redis.url".to_string(),
                reason: format!("unsupported scheme in '{}'", self.redis.url),
            });
        }
        Ok(())
    }

    pub fn bind_address(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|err| ConfigError::InvalidValue {
                field: "server.host".to_string(),
                reason: format!("{err}"),
            })
    }
}
