//! Service settings
//!
//! Loaded with the `config` crate from `API_`-prefixed environment variables
//! on top of built-in defaults, e.g. `API_PORT=9000`, `API_CACHE_ENABLED=false`.
//! Rating parameters are not part of these settings; they come from
//! `domain_rating::RatingConfig`.

use config::{Config, ConfigError, Environment};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Settings of the HTTP service
#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSettings {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// PostgreSQL connection string
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_min_connections: u32,
    /// Redis connection string; the in-memory cache is used when absent
    pub redis_url: Option<String>,
    pub cache_enabled: bool,
    pub cache_ttl_secs: u64,
    pub cache_key_prefix: String,
    /// Log level: trace, debug, info, warn, error
    pub log_level: String,
    pub log_format: LogFormat,
    /// Rating parameter file; `CONFIG_PATH` or the default path when absent
    pub rating_config_path: Option<String>,
}

impl ServiceSettings {
    /// Loads settings from the process environment
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::build(Environment::with_prefix("API").try_parsing(true))
    }

    /// Loads settings from an explicit variable map instead of the environment
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Self, ConfigError> {
        Self::build(Environment::with_prefix("API").try_parsing(true).source(Some(vars)))
    }

    fn build(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 8080_i64)?
            .set_default("database_url", "postgres://localhost/calculations")?
            .set_default("database_max_connections", 10_i64)?
            .set_default("database_min_connections", 2_i64)?
            .set_default("cache_enabled", true)?
            .set_default("cache_ttl_secs", 3600_i64)?
            .set_default("cache_key_prefix", "insurance:")?
            .set_default("log_level", "info")?
            .set_default("log_format", "pretty")?
            .add_source(environment)
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_defaults() {
        let settings = ServiceSettings::from_vars(HashMap::new()).unwrap();
        assert_eq!(settings.server_addr(), "0.0.0.0:8080");
        assert!(settings.cache_enabled);
        assert_eq!(settings.cache_ttl(), Duration::from_secs(3600));
        assert_eq!(settings.cache_key_prefix, "insurance:");
        assert_eq!(settings.log_format, LogFormat::Pretty);
        assert!(settings.redis_url.is_none());
        assert!(settings.rating_config_path.is_none());
    }

    #[test]
    fn test_environment_overrides() {
        let settings = ServiceSettings::from_vars(vars(&[
            ("API_PORT", "9000"),
            ("API_CACHE_ENABLED", "false"),
            ("API_REDIS_URL", "redis://cache:6379"),
            ("API_LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(settings.port, 9000);
        assert!(!settings.cache_enabled);
        assert_eq!(settings.redis_url.as_deref(), Some("redis://cache:6379"));
        assert_eq!(settings.log_format, LogFormat::Json);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        assert!(ServiceSettings::from_vars(vars(&[("API_PORT", "not-a-port")])).is_err());
    }
}
