use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

pub use common::config::{DatabaseConfig, MqAppConfig, ProviderConfig};

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    #[serde(default)]
    pub allow_origins: Vec<String>,
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

/// Generation listing settings.
#[derive(Debug, Deserialize, Clone)]
pub struct GenerationConfig {
    /// Page size when the client does not ask for one. Default: 50.
    #[serde(default = "default_list_limit")]
    pub list_limit: u64,
}

fn default_list_limit() -> u64 {
    50
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            list_limit: default_list_limit(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub mq: MqAppConfig,
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub generation: GenerationConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let config_path =
            std::env::var("GENMEDIA_CONFIG").unwrap_or_else(|_| "config/config".to_string());

        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.max_age", 3600)?
            .set_default("generation.list_limit", 50)?
            .add_source(File::with_name(&config_path).required(false))
            // Override from environment (e.g., GENMEDIA__PROVIDER__API_KEY)
            .add_source(
                Environment::with_prefix("GENMEDIA")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors.allow_origins")
                    .try_parsing(true),
            )
            .build()?;

        s.try_deserialize()
    }
}
