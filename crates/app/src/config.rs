//! Environment-driven configuration.

use thiserror::Error;

use malldir_audit::{DEFAULT_LOG_COLLECTION, LogContext};
use malldir_observability::{LogFormat, TracingConfig};

pub const ENV_LOG: &str = "MALLDIR_LOG";
pub const ENV_LOG_FORMAT: &str = "MALLDIR_LOG_FORMAT";
pub const ENV_AUDIT_COLLECTION: &str = "MALLDIR_AUDIT_COLLECTION";
pub const ENV_USER_AGENT: &str = "MALLDIR_USER_AGENT";
pub const ENV_ORIGIN_URL: &str = "MALLDIR_ORIGIN_URL";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is set but empty")]
    Empty { var: &'static str },

    #[error("invalid {var}='{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// `EnvFilter` directives; `None` defers to `RUST_LOG`.
    pub log_filter: Option<String>,
    pub log_format: LogFormat,
    pub audit_collection: String,
    pub log_context: LogContext,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            log_filter: None,
            log_format: LogFormat::Json,
            audit_collection: DEFAULT_LOG_COLLECTION.to_string(),
            log_context: LogContext::default(),
        }
    }
}

impl AppConfig {
    /// Read the process environment over defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as `from_env`, reading variables through `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(filter) = lookup(ENV_LOG) {
            config.log_filter = Some(non_empty(ENV_LOG, filter)?);
        }
        if let Some(format) = lookup(ENV_LOG_FORMAT) {
            config.log_format = format
                .parse::<LogFormat>()
                .map_err(|e| ConfigError::Invalid {
                    var: ENV_LOG_FORMAT,
                    value: format.clone(),
                    reason: e.to_string(),
                })?;
        }
        if let Some(collection) = lookup(ENV_AUDIT_COLLECTION) {
            let collection = non_empty(ENV_AUDIT_COLLECTION, collection)?;
            if collection.contains('/') {
                return Err(ConfigError::Invalid {
                    var: ENV_AUDIT_COLLECTION,
                    value: collection,
                    reason: "collection names must not contain '/'".into(),
                });
            }
            config.audit_collection = collection;
        }
        if let Some(agent) = lookup(ENV_USER_AGENT) {
            config.log_context.user_agent = non_empty(ENV_USER_AGENT, agent)?;
        }
        if let Some(url) = lookup(ENV_ORIGIN_URL) {
            config.log_context.url = url;
        }

        Ok(config)
    }

    pub fn tracing(&self) -> TracingConfig {
        TracingConfig {
            filter: self.log_filter.clone(),
            format: self.log_format,
        }
    }
}

fn non_empty(var: &'static str, value: String) -> Result<String, ConfigError> {
    if value.trim().is_empty() {
        Err(ConfigError::Empty { var })
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| vars.get(var).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.audit_collection, "logs");
        assert!(config.log_context.user_agent.starts_with("malldir/"));
    }

    #[test]
    fn variables_override_defaults() {
        let config = AppConfig::from_lookup(lookup(&[
            (ENV_LOG, "malldir=debug"),
            (ENV_LOG_FORMAT, "pretty"),
            (ENV_AUDIT_COLLECTION, "audit"),
            (ENV_USER_AGENT, "kiosk/2.1"),
            (ENV_ORIGIN_URL, "https://mall.test/admin"),
        ]))
        .unwrap();

        assert_eq!(config.log_filter.as_deref(), Some("malldir=debug"));
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.audit_collection, "audit");
        assert_eq!(config.log_context.user_agent, "kiosk/2.1");
        assert_eq!(config.log_context.url, "https://mall.test/admin");
        assert_eq!(config.tracing().format, LogFormat::Pretty);
    }

    #[test]
    fn invalid_values_are_reported() {
        let err = AppConfig::from_lookup(lookup(&[(ENV_LOG_FORMAT, "xml")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: ENV_LOG_FORMAT, .. }));

        let err = AppConfig::from_lookup(lookup(&[(ENV_AUDIT_COLLECTION, " ")])).unwrap_err();
        assert_eq!(err, ConfigError::Empty { var: ENV_AUDIT_COLLECTION });

        let err = AppConfig::from_lookup(lookup(&[(ENV_AUDIT_COLLECTION, "a/b")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { .. }));
    }
}
