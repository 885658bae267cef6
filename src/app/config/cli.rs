use super::serde_helpers::{
    load_env_flag, load_env_path_opt, load_env_string, load_env_string_opt, load_env_var,
};
use super::{ConfigError, LogLevel};
use crate::collector::CollectorConfig;
use crate::transport::Route;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ROUTE: &str = "logstash://127.0.0.1:5000";

#[derive(Parser, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[command(author, version, about, long_about = None)]
#[serde(default)]
pub struct Config {
    /// Route URI: logstash[+udp|+tcp|+tls]://host:port[?option=value&...]
    #[arg(long, env = "ROUTE", default_value = DEFAULT_ROUTE)]
    pub route: String,

    /// Docker daemon socket (unix path or unix:// URI; tcp:// is not supported)
    #[arg(long, env = "DOCKER_HOST")]
    pub docker_host: Option<String>,

    /// Only follow containers carrying this label (key or key=value)
    #[arg(long, env = "FILTER_LABEL")]
    pub filter_label: Option<String>,

    /// Lines of history to send per container on attach ("all" or a number)
    #[arg(long, env = "LOG_TAIL", default_value = "0")]
    pub tail: String,

    /// Capacity of the channel between the Docker streams and the adapter
    #[arg(long, env = "CHANNEL_CAPACITY", default_value = "1024")]
    pub channel_capacity: usize,

    /// Seconds between container rediscovery passes
    #[arg(long, env = "DISCOVERY_INTERVAL_SECS", default_value = "10")]
    pub discovery_interval_secs: u64,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,

    /// Emit the adapter's own logs as JSON
    #[arg(long, env = "LOG_JSON")]
    pub log_json: bool,

    /// Configuration file path (optional)
    #[arg(long, env = "CONFIG_FILE")]
    pub config_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            route: DEFAULT_ROUTE.to_string(),
            docker_host: None,
            filter_label: None,
            tail: "0".to_string(),
            channel_capacity: 1024,
            discovery_interval_secs: 10,
            log_level: LogLevel::Info,
            log_json: false,
            config_file: None,
        }
    }
}

impl Config {
    pub fn from_args<I, T>(args: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::try_parse_from(args)
            .map_err(|e| ConfigError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Config::default();

        load_env_string("ROUTE", &mut config.route);
        load_env_string_opt("DOCKER_HOST", &mut config.docker_host);
        load_env_string_opt("FILTER_LABEL", &mut config.filter_label);
        load_env_string("LOG_TAIL", &mut config.tail);
        load_env_var("CHANNEL_CAPACITY", &mut config.channel_capacity)?;
        load_env_var("DISCOVERY_INTERVAL_SECS", &mut config.discovery_interval_secs)?;

        // LogLevel requires special handling for case-insensitive parsing
        if let Ok(log_level) = std::env::var("LOG_LEVEL") {
            config.log_level = LogLevel::parse_name(&log_level).ok_or_else(|| {
                ConfigError::EnvError(format!("Invalid LOG_LEVEL: {log_level}"))
            })?;
        }

        load_env_flag("LOG_JSON", &mut config.log_json)?;
        load_env_path_opt("CONFIG_FILE", &mut config.config_file);

        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parsed route. Each call yields a fresh route id.
    pub fn route(&self) -> Result<Route, ConfigError> {
        Ok(Route::parse(&self.route)?)
    }

    pub fn discovery_interval(&self) -> Duration {
        Duration::from_secs(self.discovery_interval_secs)
    }

    pub fn collector_config(&self) -> CollectorConfig {
        CollectorConfig {
            docker_host: self
                .docker_host
                .as_deref()
                .map(|host| host.trim_start_matches("unix://").to_string()),
            filter_label: self.filter_label.clone(),
            tail: self.tail.clone(),
            discovery_interval: self.discovery_interval(),
        }
    }
}
