pub mod config;
pub mod logging_system;
pub mod shutdown;

pub use config::{Config, ConfigError, LogLevel};
pub use logging_system::{LoggingError, LoggingSystem, setup_logging_safe};

use crate::adapter::LogstashAdapter;
use crate::collector::{CollectorError, DockerCollector};
use crate::domain::AdapterError;
use crate::transport::AdapterTransports;
use clap::Parser;
use shutdown::{SHUTDOWN_TIMEOUT, join_with_timeout, spawn_signal_handler};
use std::process;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Logging(#[from] LoggingError),
    #[error(transparent)]
    Collector(#[from] CollectorError),
    #[error(transparent)]
    Adapter(#[from] AdapterError),
}

impl AppError {
    /// Process exit status for this error: 3 when the adapter could not
    /// reconnect, 1 for everything else.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Adapter(e) => e.exit_code(),
            _ => 1,
        }
    }
}

pub struct App {
    config: Config,
    transports: AdapterTransports,
}

impl App {
    pub fn from_args<I, T>(args: I) -> Result<Self, AppError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let config = Config::from_args(args)?;
        Self::from_config(config)
    }

    /// Builds the app with the built-in transports. A `config_file` replaces
    /// the remaining settings.
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let config = if let Some(config_file) = &config.config_file {
            eprintln!("Loading configuration from file: {}", config_file.display());
            Config::from_file(config_file)?
        } else {
            config
        };

        Ok(Self {
            config,
            transports: AdapterTransports::with_defaults(),
        })
    }

    pub fn with_transports(mut self, transports: AdapterTransports) -> Self {
        self.transports = transports;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn transports(&self) -> &AdapterTransports {
        &self.transports
    }

    /// Runs until the record source ends or the adapter gives up.
    ///
    /// The adapter dials before Docker is contacted, so a bad route fails
    /// without touching the daemon.
    pub async fn run(self) -> Result<(), AppError> {
        let route = self.config.route()?;
        info!(
            "Routing container logs to {} (route {}, transport {})",
            route.address,
            route.id,
            route.adapter_transport(crate::adapter::DEFAULT_TRANSPORT)
        );

        let mut adapter = LogstashAdapter::new(route, &self.transports).await?;
        let collector = DockerCollector::new(self.config.collector_config()).await?;

        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let cancel = CancellationToken::new();
        let collector_task = tokio::spawn(collector.run(tx, cancel.clone()));
        let signal_task = spawn_signal_handler(cancel.clone());

        info!("logstash-adapter is running. Press Ctrl+C to stop.");
        let delivery = adapter.stream(rx).await;

        cancel.cancel();
        signal_task.abort();
        let collected = join_with_timeout(collector_task, SHUTDOWN_TIMEOUT).await;

        delivery?;
        match collected {
            Some(Err(e)) => Err(e.into()),
            Some(Ok(())) => {
                info!("logstash-adapter stopped.");
                Ok(())
            }
            None => {
                warn!("Collector did not stop cleanly");
                Ok(())
            }
        }
    }
}

pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// Main entry point for the binary; owns the process exit policy.
pub async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 && (args[1] == "--version" || args[1] == "-V") {
        println!("logstash-adapter {}", get_version());
        return Ok(());
    }

    if args.len() > 1 && (args[1] == "--help" || args[1] == "-h") {
        Config::parse_from(["logstash-adapter", "--help"]);
        return Ok(());
    }

    let app = match App::from_args(args) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            process::exit(e.exit_code());
        }
    };

    let config = app.config();
    if let Err(e) = setup_logging_safe(config.log_level, config.log_json) {
        eprintln!("Logging setup failed: {e}");
        process::exit(AppError::from(e).exit_code());
    }
    info!("Starting logstash-adapter v{}", get_version());

    if let Err(e) = app.run().await {
        error!("Application error: {}", e);
        process::exit(e.exit_code());
    }

    Ok(())
}
