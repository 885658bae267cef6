use super::config::LogLevel;
use parking_lot::RwLock;
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log level '{input}'")]
    InvalidLogLevel { input: String },

    #[error("Invalid directive format '{input}'. Expected: 'target=level'")]
    InvalidDirectiveFormat { input: String },

    #[error("Empty target in directive '{input}'")]
    EmptyTarget { input: String },

    #[error("Logging system initialization failed: {details}")]
    InitFailed {
        details: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogDirective {
    pub target: String,
    pub level: LogLevel,
}

impl LogDirective {
    pub fn new(target: impl Into<String>, level: LogLevel) -> Self {
        Self {
            target: target.into(),
            level,
        }
    }

    pub fn parse(directive: &str) -> Result<Self, LoggingError> {
        let Some((target, level)) = directive.split_once('=') else {
            return Err(LoggingError::InvalidDirectiveFormat {
                input: directive.to_string(),
            });
        };

        let target = target.trim();
        if target.is_empty() {
            return Err(LoggingError::EmptyTarget {
                input: directive.to_string(),
            });
        }

        let level = LogLevel::parse_name(level).ok_or_else(|| LoggingError::InvalidLogLevel {
            input: level.to_string(),
        })?;

        Ok(LogDirective::new(target, level))
    }

    pub fn to_filter_string(&self) -> String {
        format!("{}={}", self.target, self.level.as_str())
    }
}

/// Collects `target=level` directives and installs the global subscriber.
pub struct LoggingSystem {
    directives: Arc<RwLock<Vec<LogDirective>>>,
    fallback_level: LogLevel,
}

impl LoggingSystem {
    pub fn new() -> Self {
        Self {
            directives: Arc::new(RwLock::new(Vec::new())),
            fallback_level: LogLevel::Info,
        }
    }

    /// Adds a directive. A bad level falls back to the default level; a
    /// malformed directive is skipped.
    pub fn add_directive(&self, directive_str: &str) -> Result<(), LoggingError> {
        match LogDirective::parse(directive_str) {
            Ok(directive) => {
                self.directives.write().push(directive);
                Ok(())
            }
            Err(LoggingError::InvalidLogLevel { .. }) => {
                let target = directive_str.split('=').next().unwrap_or_default().trim();
                eprintln!("Warning: invalid level in '{directive_str}', using default level");
                self.directives
                    .write()
                    .push(LogDirective::new(target, self.fallback_level));
                Ok(())
            }
            Err(LoggingError::InvalidDirectiveFormat { .. } | LoggingError::EmptyTarget { .. }) => {
                eprintln!("Warning: skipping log directive '{directive_str}'");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    /// Caps chatty dependency targets at `warn`.
    pub fn add_default_directives(&self) {
        let default_directives = &[
            ("bollard", LogLevel::Warn),
            ("hyper", LogLevel::Warn),
            ("hyper_util", LogLevel::Warn),
            ("rustls", LogLevel::Warn),
            ("tokio_rustls", LogLevel::Warn),
        ];

        let mut directives = self.directives.write();
        for (target, level) in default_directives {
            directives.push(LogDirective::new(*target, *level));
        }
    }

    /// Adds every comma-separated directive of a `RUST_LOG`-style string.
    pub fn add_directives_from(&self, directives: &str) -> Result<(), LoggingError> {
        for directive in directives.split(',').map(str::trim).filter(|d| !d.is_empty()) {
            self.add_directive(directive)?;
        }
        Ok(())
    }

    pub fn build_filter_string(&self, default_level: LogLevel) -> String {
        let directives = self.directives.read();

        let mut filter_parts = Vec::with_capacity(directives.len() + 1);
        filter_parts.push(default_level.as_str().to_string());
        filter_parts.extend(directives.iter().map(LogDirective::to_filter_string));
        filter_parts.join(",")
    }

    pub fn initialize_tracing(&self, default_level: LogLevel, json: bool) -> Result<(), LoggingError> {
        let filter_string = self.build_filter_string(default_level);

        let env_filter =
            EnvFilter::try_new(&filter_string).map_err(|e| LoggingError::InitFailed {
                details: format!("Failed to create EnvFilter with '{filter_string}'"),
                source: Box::new(e),
            })?;

        let (json_layer, compact_layer) = if json {
            (Some(fmt::layer().json().with_target(true)), None)
        } else {
            (
                None,
                Some(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_ansi(true)
                        .compact(),
                ),
            )
        };

        let subscriber = tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .with(compact_layer);

        tracing::subscriber::set_global_default(subscriber).map_err(|e| {
            LoggingError::InitFailed {
                details: "Failed to set global tracing subscriber".to_string(),
                source: Box::new(e),
            }
        })
    }

    pub fn directive_count(&self) -> usize {
        self.directives.read().len()
    }
}

impl Default for LoggingSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Installs the global subscriber once per process; later calls report
/// whether the first one succeeded.
pub fn setup_logging_safe(level: LogLevel, json: bool) -> Result<(), LoggingError> {
    static INIT_SUCCESS: OnceLock<bool> = OnceLock::new();

    let initialized = *INIT_SUCCESS.get_or_init(|| {
        let logging_system = LoggingSystem::new();
        logging_system.add_default_directives();

        let result = std::env::var("RUST_LOG")
            .map_or(Ok(()), |directives| logging_system.add_directives_from(&directives))
            .and_then(|()| logging_system.initialize_tracing(level, json));

        match result {
            Ok(()) => true,
            Err(e) => {
                eprintln!("Logging initialization failed: {e}");
                false
            }
        }
    });

    if initialized {
        Ok(())
    } else {
        Err(LoggingError::InitFailed {
            details: "Logging system initialization failed".to_string(),
            source: Box::new(std::io::Error::other("Logging initialization error")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_directive_parse() {
        let directive = LogDirective::parse("bollard=warn").unwrap();
        assert_eq!(directive, LogDirective::new("bollard", LogLevel::Warn));
        assert_eq!(directive.to_filter_string(), "bollard=warn");

        assert!(matches!(
            LogDirective::parse("bollard"),
            Err(LoggingError::InvalidDirectiveFormat { .. })
        ));
        assert!(matches!(
            LogDirective::parse("=warn"),
            Err(LoggingError::EmptyTarget { .. })
        ));
        assert!(matches!(
            LogDirective::parse("bollard=loud"),
            Err(LoggingError::InvalidLogLevel { .. })
        ));
    }

    #[test]
    fn test_fallback_strategies() {
        let logging_system = LoggingSystem::new();

        let test_cases = vec![
            ("hyper=warn", 1),            // Valid
            ("invalid_format", 1),        // Skipped
            ("target=invalid_level", 2),  // Default level
            ("=empty", 2),                // Skipped
            ("", 2),                      // Skipped
        ];

        for (directive, expected_count) in test_cases {
            assert!(logging_system.add_directive(directive).is_ok(), "Directive: {directive}");
            assert_eq!(
                logging_system.directive_count(),
                expected_count,
                "Directive: {directive}"
            );
        }
    }

    #[test]
    fn test_build_filter_string() {
        let logging_system = LoggingSystem::new();
        assert_eq!(logging_system.build_filter_string(LogLevel::Info), "info");

        logging_system.add_default_directives();
        logging_system
            .add_directives_from("logstash_adapter=trace, ,hyper=error")
            .unwrap();

        let filter = logging_system.build_filter_string(LogLevel::Debug);
        assert!(filter.starts_with("debug,"));
        assert!(filter.contains("bollard=warn"));
        assert!(filter.contains("logstash_adapter=trace"));
        assert!(filter.ends_with("hyper=error"));
        assert!(EnvFilter::try_new(&filter).is_ok());
    }

    #[test]
    fn test_setup_logging_safe_is_idempotent() {
        let first = setup_logging_safe(LogLevel::Info, false);
        let second = setup_logging_safe(LogLevel::Debug, true);
        assert_eq!(first.is_ok(), second.is_ok());
    }
}
