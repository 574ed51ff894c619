//! Runtime configuration.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid runtime config: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

/// Bounds every construction and render of user code. Each component gets
/// its own engine, so the limits apply per block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionLimits {
    /// Wall-clock budget of one construction or render, in milliseconds.
    pub time_limit_ms: u64,
    /// Heap ceiling of the engine, in bytes.
    pub memory_limit: usize,
    /// Native stack the engine may use, in bytes. Runaway recursion fails
    /// with a stack overflow error once it is exhausted.
    pub max_stack_size: usize,
}

impl Default for ExecutionLimits {
    fn default() -> Self {
        ExecutionLimits {
            time_limit_ms: 1_000,
            memory_limit: 16 * 1024 * 1024,
            max_stack_size: 256 * 1024,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RuntimeConfig {
    pub environment: Environment,
    pub limits: ExecutionLimits,
    /// How many unsupported paths the placeholder lists before "and N more".
    pub max_listed_dependencies: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        RuntimeConfig {
            environment: Environment::Development,
            limits: ExecutionLimits::default(),
            max_listed_dependencies: 3,
        }
    }
}

impl RuntimeConfig {
    pub fn production() -> Self {
        RuntimeConfig {
            environment: Environment::Production,
            ..RuntimeConfig::default()
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Reads `NODE_ENV`; everything except `production` is development.
    pub fn from_env() -> Self {
        let environment = match std::env::var("NODE_ENV").as_deref() {
            Ok("production") => Environment::Production,
            _ => Environment::Development,
        };
        RuntimeConfig {
            environment,
            ..RuntimeConfig::default()
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == Environment::Production
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = RuntimeConfig::from_json(r#"{ "environment": "production", "limits": { "timeLimitMs": 500 } }"#)
            .unwrap();
        assert!(config.is_production());
        assert_eq!(config.limits.time_limit_ms, 500);
        assert_eq!(config.limits.memory_limit, ExecutionLimits::default().memory_limit);
        assert_eq!(config.max_listed_dependencies, 3);
    }

    #[test]
    fn test_invalid_json_is_reported() {
        let err = RuntimeConfig::from_json("{ environment: 1 }").unwrap_err();
        assert!(err.to_string().starts_with("invalid runtime config"));
    }

    #[test]
    fn test_unknown_environment_is_rejected() {
        assert!(RuntimeConfig::from_json(r#"{ "environment": "staging" }"#).is_err());
    }
}
