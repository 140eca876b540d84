//! Logging bootstrap for the tspurge binary.

use crate::{Error, Result};

use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

/// Output format of the log subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = Error;

    fn from_str(raw: &str) -> Result<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "text" | "pretty" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(Error::Config(format!(
                "invalid log format '{other}', expected one of [text, json]"
            ))),
        }
    }
}

/// Parsed logging configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub service_name: String,
    pub level: Level,
    pub format: LogFormat,
}

impl TelemetryConfig {
    pub fn new(service_name: &str, log_level: &str, log_format: &str) -> Result<Self> {
        let service_name = service_name.trim();
        if service_name.is_empty() {
            return Err(Error::Config("service name cannot be empty".to_string()));
        }

        Ok(Self {
            service_name: service_name.to_string(),
            level: parse_log_level(log_level)?,
            format: log_format.parse()?,
        })
    }
}

/// Handle for the installed subscriber.
pub struct Telemetry {
    config: TelemetryConfig,
}

impl Telemetry {
    /// Install the global tracing subscriber. Logs go to stderr so stdout
    /// stays free for purge results.
    pub fn init_for_component(
        service_name: &str,
        log_level: &str,
        log_format: &str,
    ) -> Result<Self> {
        let config = TelemetryConfig::new(service_name, log_level, log_format)?;

        let builder = FmtSubscriber::builder()
            .with_max_level(config.level)
            .with_target(true)
            .with_writer(std::io::stderr);

        let installed = match config.format {
            LogFormat::Json => builder.json().try_init(),
            LogFormat::Text => builder.try_init(),
        };
        installed.map_err(|e| {
            Error::Config(format!("failed to initialize log subscriber: {e}"))
        })?;

        info!(
            service_name = %config.service_name,
            log_level = %config.level,
            log_format = config.format.as_str(),
            "Logging initialized"
        );

        Ok(Self { config })
    }

    pub fn service_name(&self) -> &str {
        &self.config.service_name
    }

    pub fn format(&self) -> LogFormat {
        self.config.format
    }
}

fn parse_log_level(raw: &str) -> Result<Level> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => Err(Error::Config(format!(
            "invalid log level '{other}', expected one of [trace, debug, info, warn, error]"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_log_level_is_case_insensitive() {
        assert_eq!(parse_log_level(" DEBUG ").unwrap(), Level::DEBUG);
    }

    #[test]
    fn parse_log_level_rejects_unknown() {
        let err = parse_log_level("verbose").unwrap_err();
        assert!(format!("{err}").contains("invalid log level"));
    }

    #[test]
    fn telemetry_config_rejects_bad_format() {
        let err = TelemetryConfig::new("tspurge", "info", "xml").unwrap_err();
        assert!(format!("{err}").contains("log format"));
    }

    #[test]
    fn telemetry_config_rejects_empty_service_name() {
        assert!(TelemetryConfig::new(" ", "info", "text").is_err());
    }
}
