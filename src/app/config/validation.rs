use super::{Config, ConfigError};
use crate::adapter::ADAPTER_NAME;

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // Validate route URI and adapter name
        let route = self.route()?;
        if route.adapter_name() != ADAPTER_NAME {
            return Err(ConfigError::InvalidConfig(format!(
                "Route adapter must be '{ADAPTER_NAME}', got '{}'",
                route.adapter
            )));
        }

        if self.channel_capacity == 0 {
            return Err(ConfigError::InvalidConfig(
                "Channel capacity must be greater than 0".to_string(),
            ));
        }

        if self.discovery_interval_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Discovery interval must be greater than 0".to_string(),
            ));
        }

        if self.tail != "all" && self.tail.parse::<u64>().is_err() {
            return Err(ConfigError::InvalidConfig(format!(
                "Tail must be 'all' or a non-negative number, got '{}'",
                self.tail
            )));
        }

        if let Some(host) = self.docker_host.as_deref() {
            if host.is_empty() {
                return Err(ConfigError::InvalidConfig(
                    "Docker host must not be empty".to_string(),
                ));
            }
            // Only unix sockets are supported: a bare path or unix://path
            if let Some((scheme, _)) = host.split_once("://") {
                if scheme != "unix" {
                    return Err(ConfigError::InvalidConfig(format!(
                        "Docker host must be a unix socket path or unix:// URI, got '{host}'"
                    )));
                }
            }
        }

        Ok(())
    }
}
