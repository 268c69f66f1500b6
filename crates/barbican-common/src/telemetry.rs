//! Structured logging initialization
//!
//! JSON log lines filtered through `RUST_LOG`, falling back to the configured
//! default directive when the variable is unset.

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Errors that can occur during logging initialization
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The filter directive could not be parsed
    #[error("invalid log filter '{directive}': {message}")]
    InvalidFilter {
        /// Directive that failed to parse
        directive: String,
        /// Parser message
        message: String,
    },

    /// Failed to initialize tracing subscriber (usually: one is already set)
    #[error("failed to initialize tracing subscriber: {0}")]
    SubscriberInit(String),
}

/// Configuration for logging initialization
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Directive used when `RUST_LOG` is not set (e.g., "info,barbican_worker=debug")
    pub default_directive: String,

    /// Emit JSON instead of human-readable lines
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            service_name: crate::COMPONENT_WORKER.to_string(),
            default_directive: "info".to_string(),
            json: true,
        }
    }
}

impl LoggingConfig {
    /// Build the env filter, preferring `RUST_LOG` over the default directive
    pub fn env_filter(&self) -> Result<EnvFilter, TelemetryError> {
        if let Ok(filter) = EnvFilter::try_from_default_env() {
            return Ok(filter);
        }
        EnvFilter::try_new(&self.default_directive).map_err(|e| TelemetryError::InvalidFilter {
            directive: self.default_directive.clone(),
            message: e.to_string(),
        })
    }
}

/// Install the global tracing subscriber.
///
/// # Example
///
/// ```ignore
/// use barbican_common::telemetry::{init_logging, LoggingConfig};
///
/// init_logging(LoggingConfig::default())?;
/// ```
pub fn init_logging(config: LoggingConfig) -> Result<(), TelemetryError> {
    let filter = config.env_filter()?;

    let result = if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_target(true))
            .try_init()
    };
    result.map_err(|e| TelemetryError::SubscriberInit(e.to_string()))?;

    tracing::info!(service = %config.service_name, "logging initialized");
    Ok(())
}
