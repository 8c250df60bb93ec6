//! Configuration management

use queuedeck_api::RouteOptions;
use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub panel: PanelConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

#[derive(Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
            host: default_host(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct PanelConfig {
    #[serde(default)]
    pub base_path: String,

    /// Names of the queues to manage
    #[serde(default)]
    pub queues: Vec<String>,

    #[serde(default)]
    pub route_options: RouteOptions,

    /// Seed every queue with sample jobs
    #[serde(default)]
    pub demo: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum StoreConfig {
    #[serde(rename = "static")]
    Static,

    #[serde(rename = "redis")]
    Redis { url: String },
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::Static
    }
}

fn default_port() -> u16 {
    3000
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

impl Config {
    /// Load configuration from file and environment
    pub fn load(path: Option<&str>) -> anyhow::Result<Self> {
        let file = match path {
            Some(path) => config::File::with_name(path).required(true),
            None => config::File::with_name("queuedeck").required(false),
        };

        let config = config::Config::builder()
            .add_source(file)
            .add_source(config::Environment::with_prefix("QUEUEDECK").separator("__"))
            .build()?;

        Ok(config.try_deserialize::<Config>()?)
    }
}
