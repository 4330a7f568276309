//! Deployment settings and configuration.
//!
//! The deployment engine launches programs with their settings in the environment. These are read
//! once, by [`DeploymentSettings::from_env`], and then accessed through the
//! [`Deployment`](crate::Deployment) via [`Config`].

use std::{collections::BTreeMap, env, fmt, sync::Arc};

use serde::de::DeserializeOwned;
use serde_json::Value;

/// Environment variable holding the project name.
pub const PROJECT_ENV: &str = "PULUMI_PROJECT";

/// Environment variable holding the stack name.
pub const STACK_ENV: &str = "PULUMI_STACK";

/// Environment variable that is `true` when the deployment is a preview.
pub const DRY_RUN_ENV: &str = "PULUMI_DRY_RUN";

/// Environment variable holding configuration as a JSON object of `namespace:key` to value.
pub const CONFIG_ENV: &str = "PULUMI_CONFIG";

/// Settings for a deployment.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DeploymentSettings {
    /// The name of the project being deployed.
    pub project: String,

    /// The name of the stack being deployed.
    pub stack: String,

    /// Whether this deployment is a preview.
    ///
    /// During a preview the engine may report some values as unknown.
    pub dry_run: bool,

    /// Configuration values, keyed by `namespace:key`.
    pub config: BTreeMap<String, String>,
}

impl DeploymentSettings {
    /// Construct settings for the given `project` and `stack`.
    pub fn new(project: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            stack: stack.into(),
            dry_run: false,
            config: BTreeMap::new(),
        }
    }

    /// Read settings from the environment the engine launched the program with.
    ///
    /// # Errors
    ///
    /// Returns an error if the project or stack are not set, or if the configuration is not a
    /// JSON object.
    pub fn from_env() -> Result<Self, ConfigError> {
        let project = required_var(PROJECT_ENV)?;
        let stack = required_var(STACK_ENV)?;
        let dry_run = env::var(DRY_RUN_ENV)
            .map(|value| value.eq_ignore_ascii_case("true"))
            .unwrap_or(false);
        let config = match env::var(CONFIG_ENV) {
            Ok(json) => parse_config(&json)?,
            Err(_) => BTreeMap::new(),
        };

        Ok(Self {
            project,
            stack,
            dry_run,
            config,
        })
    }

    /// Set the value for `dry_run`.
    ///
    /// **Note:** this consumes and returns `self` for chaining.
    #[must_use]
    pub fn set_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set a configuration value for `key` (of the form `namespace:key`).
    ///
    /// **Note:** this consumes and returns `self` for chaining.
    #[must_use]
    pub fn set_config(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}

impl Default for DeploymentSettings {
    fn default() -> Self {
        Self::new("project", "stack")
    }
}

fn required_var(name: &'static str) -> Result<String, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVariable { name }),
    }
}

fn parse_config(json: &str) -> Result<BTreeMap<String, String>, ConfigError> {
    let object: serde_json::Map<String, Value> =
        serde_json::from_str(json).map_err(|error| ConfigError::InvalidVariable {
            name: CONFIG_ENV,
            message: error.to_string(),
        })?;

    // Values are strings on the wire, but tolerate structured values by keeping their JSON.
    Ok(object
        .into_iter()
        .map(|(key, value)| match value {
            Value::String(value) => (key, value),
            other => (key, other.to_string()),
        })
        .collect())
}

/// Configuration values for a single namespace.
///
/// Obtained from [`Deployment::config`](crate::Deployment::config).
#[derive(Clone, Debug)]
pub struct Config {
    namespace: String,
    values: Arc<BTreeMap<String, String>>,
}

impl Config {
    pub(crate) fn new(namespace: impl Into<String>, values: Arc<BTreeMap<String, String>>) -> Self {
        Self {
            namespace: namespace.into(),
            values,
        }
    }

    /// The namespace of this configuration.
    #[must_use]
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    fn full_key(&self, key: &str) -> String {
        format!("{}:{}", self.namespace, key)
    }

    /// Get the value for `key`, if set.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(&self.full_key(key)).map(String::as_str)
    }

    /// Get the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingKey`] if the key is not set.
    pub fn require(&self, key: &str) -> Result<&str, ConfigError> {
        self.get(key).ok_or_else(|| ConfigError::MissingKey {
            key: self.full_key(key),
        })
    }

    /// Get the value for `key` as a boolean, if set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the value is not `true` or `false`.
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        self.get_object(key)
    }

    /// Get the value for `key` as an integer, if set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the value is not an integer.
    pub fn get_i64(&self, key: &str) -> Result<Option<i64>, ConfigError> {
        self.get_object(key)
    }

    /// Get the value for `key` deserialized from JSON, if set.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if the value cannot be deserialized into `T`.
    pub fn get_object<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        self.get(key)
            .map(|value| {
                serde_json::from_str(value).map_err(|error| ConfigError::InvalidValue {
                    key: self.full_key(key),
                    message: error.to_string(),
                })
            })
            .transpose()
    }
}

/// Errors that can occur when reading settings or configuration.
#[derive(Debug, Eq, PartialEq)]
pub enum ConfigError {
    /// A required environment variable was not set.
    MissingVariable {
        /// The name of the variable.
        name: &'static str,
    },

    /// An environment variable had an invalid value.
    InvalidVariable {
        /// The name of the variable.
        name: &'static str,

        /// A description of the problem.
        message: String,
    },

    /// A required configuration key was not set.
    MissingKey {
        /// The full (`namespace:key`) configuration key.
        key: String,
    },

    /// A configuration value could not be interpreted as the requested type.
    InvalidValue {
        /// The full (`namespace:key`) configuration key.
        key: String,

        /// A description of the problem.
        message: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingVariable { name } => {
                write!(f, "Missing required environment variable {}", name)
            }
            Self::InvalidVariable { name, message } => {
                write!(f, "Invalid value for environment variable {}: {}", name, message)
            }
            Self::MissingKey { key } => write!(f, "Missing required configuration key {}", key),
            Self::InvalidValue { key, message } => {
                write!(f, "Invalid value for configuration key {}: {}", key, message)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(pairs: &[(&str, &str)]) -> Config {
        let values = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        Config::new("awstags", Arc::new(values))
    }

    #[test]
    fn parse_config_accepts_strings_and_json() {
        let parsed = parse_config(r#"{"awstags:region": "eu-west-2", "awstags:retries": 3}"#)
            .unwrap();
        assert_eq!(parsed.get("awstags:region").unwrap(), "eu-west-2");
        assert_eq!(parsed.get("awstags:retries").unwrap(), "3");

        assert!(matches!(
            parse_config("[]"),
            Err(ConfigError::InvalidVariable { name: CONFIG_ENV, .. })
        ));
    }

    #[test]
    fn namespaced_access() {
        let config = config(&[
            ("awstags:region", "eu-west-2"),
            ("awstags:strict", "true"),
            ("other:region", "us-east-1"),
        ]);

        assert_eq!(config.get("region"), Some("eu-west-2"));
        assert_eq!(config.get_bool("strict"), Ok(Some(true)));
        assert_eq!(config.get_i64("missing"), Ok(None));
        assert_eq!(
            config.require("missing"),
            Err(ConfigError::MissingKey {
                key: "awstags:missing".to_string()
            })
        );
        assert!(matches!(
            config.get_i64("region"),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
