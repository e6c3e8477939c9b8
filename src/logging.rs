use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::{env_lookup, optional, parse_or};
use crate::errors::AppError;

const DEFAULT_SERVICE_NAME: &str = "quote-archive";
const DEFAULT_ENVIRONMENT: &str = "development";
const DEFAULT_LOG_FILTER: &str = "quote_archive=info,info";

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub loki_enabled: bool,
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
    /// Which entry point is running (`collect`, `load`, `serve`).
    /// Shipped as a Loki label so one-shot job runs can be told apart
    /// from the long-running server.
    pub component: String,
}

impl LoggingConfig {
    pub fn from_env(component: &str) -> Result<Self, AppError> {
        Self::from_lookup(env_lookup, component)
    }

    pub fn from_lookup<F>(lookup: F, component: &str) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            loki_enabled: parse_or(&lookup, "LOKI_ENABLED", false)?,
            loki_url: optional(&lookup, "LOKI_URL"),
            service_name: optional(&lookup, "SERVICE_NAME")
                .unwrap_or_else(|| DEFAULT_SERVICE_NAME.to_string()),
            environment: optional(&lookup, "ENVIRONMENT")
                .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_string()),
            log_level: optional(&lookup, "RUST_LOG")
                .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string()),
            component: component.to_string(),
        })
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.loki_enabled && self.loki_url.is_none() {
            return Err(AppError::Config(
                "LOKI_ENABLED is true but LOKI_URL is not set".to_string(),
            ));
        }
        tracing_subscriber::EnvFilter::try_new(&self.log_level)
            .map_err(|e| AppError::Config(format!("RUST_LOG '{}' is invalid: {}", self.log_level, e)))?;
        Ok(())
    }
}

/// Installs the global subscriber. Call once, before any job runs.
///
/// Events go to stderr; stdout is reserved for the job result printed by
/// the CLI. Shipping to Loki spawns a background task, so with the `loki`
/// feature this must run inside a Tokio runtime.
pub fn init_logging(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    config.validate()?;

    #[cfg(feature = "loki")]
    {
        if config.loki_enabled {
            if let Some(loki_url) = config.loki_url.clone() {
                return init_with_loki(config, &loki_url);
            }
        }
    }

    init_console_only(config)
}

fn init_console_only(config: LoggingConfig) -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()?;

    tracing::debug!(
        service = %config.service_name,
        component = %config.component,
        "📊 Console-only logging initialized"
    );
    Ok(())
}

#[cfg(feature = "loki")]
fn init_with_loki(config: LoggingConfig, loki_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    let url = url::Url::parse(loki_url)?;

    let (loki_layer, task) = tracing_loki::builder()
        .label("service", &config.service_name)?
        .label("environment", &config.environment)?
        .label("component", &config.component)?
        .build_url(url)?;

    tokio::spawn(task);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(&config.log_level))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(loki_layer)
        .try_init()?;

    tracing::info!(
        component = %config.component,
        "✅ Loki logging initialized at {}",
        loki_url
    );

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_carry_component() {
        let config = LoggingConfig::from_lookup(lookup_from(&[]), "load").unwrap();

        assert!(!config.loki_enabled);
        assert_eq!(config.service_name, DEFAULT_SERVICE_NAME);
        assert_eq!(config.log_level, DEFAULT_LOG_FILTER);
        assert_eq!(config.component, "load");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_loki_requires_url() {
        let config =
            LoggingConfig::from_lookup(lookup_from(&[("LOKI_ENABLED", "true")]), "serve").unwrap();
        assert!(config.validate().is_err());

        let config = LoggingConfig::from_lookup(
            lookup_from(&[("LOKI_ENABLED", "true"), ("LOKI_URL", "http://loki:3100")]),
            "serve",
        )
        .unwrap();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_garbled_loki_flag_is_rejected() {
        assert!(LoggingConfig::from_lookup(lookup_from(&[("LOKI_ENABLED", "yes")]), "collect").is_err());
    }
}
