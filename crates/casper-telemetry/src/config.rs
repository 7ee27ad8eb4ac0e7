//! Telemetry configuration from environment variables.

use std::env;

/// Configuration for logging and metrics exposition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    /// Service name attached to every log line
    pub service_name: String,

    /// Log filter directive (trace, debug, info, warn, error or a full
    /// `EnvFilter` expression such as `info,cc_04_finality=debug`)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Whether to include the module target in each line
    pub with_target: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "casper-core".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            with_target: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `CC_SERVICE_NAME`: Service name (default: casper-core)
    /// - `CC_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `CC_JSON_LOGS`: Enable JSON logs (default: false, true in containers)
    /// - `CC_LOG_TARGET`: Include module targets (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Self::from_env`] with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let is_container =
            lookup("KUBERNETES_SERVICE_HOST").is_some() || lookup("DOCKER_CONTAINER").is_some();

        Self {
            service_name: lookup("CC_SERVICE_NAME").unwrap_or(defaults.service_name),

            log_level: lookup("CC_LOG_LEVEL")
                .or_else(|| lookup("RUST_LOG"))
                .unwrap_or(defaults.log_level),

            json_logs: lookup("CC_JSON_LOGS")
                .map(|v| parse_flag(&v))
                .unwrap_or(is_container),

            with_target: lookup("CC_LOG_TARGET")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.with_target),
        }
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
