//! Database configuration.
//!
//! [`DatabaseConfig`] can be read from a YAML document (optionally nested
//! under a dotted section key such as `app.database`) or from environment
//! variables. `.env` files are loaded first and never overwrite variables
//! that are already set.
//!
//! | Variable | Field | Default |
//! |----------|-------|---------|
//! | `DATABASE_URL` | `url` | required |
//! | `DATABASE_MAX_CONNECTIONS` | `max_connections` | 10 |
//! | `DATABASE_MIN_CONNECTIONS` | `min_connections` | 0 |
//! | `DATABASE_ACQUIRE_TIMEOUT_SECS` | `acquire_timeout_secs` | 30 |
//! | `DATABASE_IDLE_TIMEOUT_SECS` | `idle_timeout_secs` | none |

use std::time::Duration;

use garde::Validate;
use serde::Deserialize;

use crate::error::DataError;
use crate::validation::convert_garde_report;

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    30
}

/// Connection and pool settings for a handle.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Validate)]
pub struct DatabaseConfig {
    #[garde(length(min = 1))]
    pub url: String,
    #[serde(default = "default_max_connections")]
    #[garde(range(min = 1))]
    pub max_connections: u32,
    #[serde(default)]
    #[garde(custom(min_not_above_max(&self.max_connections)))]
    pub min_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    #[garde(range(min = 1))]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    #[garde(skip)]
    pub idle_timeout_secs: Option<u64>,
}

fn min_not_above_max(max: &u32) -> impl FnOnce(&u32, &()) -> garde::Result + '_ {
    move |min, _| {
        if min > max {
            return Err(garde::Error::new(format!(
                "min_connections ({min}) exceeds max_connections ({max})"
            )));
        }
        Ok(())
    }
}

impl DatabaseConfig {
    /// Config with pool defaults for `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_connections: default_max_connections(),
            min_connections: 0,
            acquire_timeout_secs: default_acquire_timeout_secs(),
            idle_timeout_secs: None,
        }
    }

    /// Parse from YAML. With `section = Some("app.database")` the config is
    /// read from the nested mapping at that path.
    pub fn from_yaml_str(content: &str, section: Option<&str>) -> Result<Self, DataError> {
        let mut value: serde_yaml::Value =
            serde_yaml::from_str(content).map_err(|e| DataError::Config(e.to_string()))?;
        if let Some(section) = section {
            for key in section.split('.') {
                value = value
                    .get(key)
                    .cloned()
                    .ok_or_else(|| DataError::Config(format!("missing config section '{section}'")))?;
            }
        }
        let config: Self =
            serde_yaml::from_value(value).map_err(|e| DataError::Config(e.to_string()))?;
        config.checked()
    }

    /// Read a YAML file, see [`from_yaml_str`](Self::from_yaml_str).
    pub fn from_yaml_file(
        path: impl AsRef<std::path::Path>,
        section: Option<&str>,
    ) -> Result<Self, DataError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| DataError::Config(e.to_string()))?;
        Self::from_yaml_str(&content, section)
    }

    /// Build from `DATABASE_*` environment variables after loading `.env`.
    pub fn from_env() -> Result<Self, DataError> {
        dotenvy::dotenv().ok();
        let url = std::env::var("DATABASE_URL")
            .map_err(|_| DataError::Config("DATABASE_URL is not set".into()))?;

        let mut config = Self::new(url);
        if let Some(v) = env_parsed("DATABASE_MAX_CONNECTIONS")? {
            config.max_connections = v;
        }
        if let Some(v) = env_parsed("DATABASE_MIN_CONNECTIONS")? {
            config.min_connections = v;
        }
        if let Some(v) = env_parsed("DATABASE_ACQUIRE_TIMEOUT_SECS")? {
            config.acquire_timeout_secs = v;
        }
        config.idle_timeout_secs = env_parsed("DATABASE_IDLE_TIMEOUT_SECS")?;
        config.checked()
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_secs)
    }

    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }

    fn checked(self) -> Result<Self, DataError> {
        self.validate().map_err(|report| {
            let details: Vec<String> = convert_garde_report(&report)
                .into_iter()
                .map(|e| format!("{}: {}", e.field, e.message))
                .collect();
            DataError::Config(details.join("; "))
        })?;
        Ok(self)
    }
}

fn env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>, DataError> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| DataError::Config(format!("{key} has an invalid value: '{raw}'"))),
        Err(_) => Ok(None),
    }
}
