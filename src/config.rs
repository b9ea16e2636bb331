use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub database: DatabaseSettings,
    pub geocoder: GeocoderSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GeocoderSettings {
    #[serde(default = "default_geocoder_endpoint")]
    pub endpoint: String,
    pub api_key: String,
    #[serde(default = "default_geocoder_timeout")]
    pub timeout_secs: u64,
}

fn default_geocoder_endpoint() -> String { "https://geocode-maps.yandex.ru/1.x".to_string() }
fn default_geocoder_timeout() -> u64 { 10 }

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_l1_cache_size")]
    pub l1_cache_size: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            l1_cache_size: default_l1_cache_size(),
        }
    }
}

fn default_l1_cache_size() -> u64 { 10_000 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with FOODCART__)
    /// 5. DATABASE_URL and YANDEX_API_KEY
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., FOODCART__SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("FOODCART")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        apply_env_overrides(settings)?.try_deserialize()
    }
}

/// Apply the conventional unprefixed variables on top of loaded settings
fn apply_env_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let mut builder = Config::builder().add_source(settings);

    if let Ok(database_url) = env::var("DATABASE_URL") {
        builder = builder.set_override("database.url", database_url)?;
    }
    if let Ok(api_key) = env::var("YANDEX_API_KEY") {
        builder = builder.set_override("geocoder.api_key", api_key)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use config::FileFormat;

    #[test]
    fn test_defaults_fill_optional_sections() {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(
                r#"
                [server]
                host = "127.0.0.1"
                port = 8080

                [database]
                url = "postgres://localhost/foodcart"

                [geocoder]
                api_key = "secret"
                "#,
                FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.geocoder.endpoint, "https://geocode-maps.yandex.ru/1.x");
        assert_eq!(settings.geocoder.timeout_secs, 10);
        assert_eq!(settings.cache.l1_cache_size, 10_000);
        assert_eq!(settings.logging.level, "info");
        assert_eq!(settings.server.workers, None);
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "compact");
    }
}
