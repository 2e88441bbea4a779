//! Configuration for db-probe

use core_config::{ConfigError, FromEnv};
use db_connector::ConnectionParameters;
use db_connector::common::RetryConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub database: ConnectionParameters,
    pub retry: RetryConfig,
}

impl Config {
    /// Apply a `--retries` override from the command line
    pub fn with_retries(mut self, retries: Option<u32>) -> Self {
        if let Some(retries) = retries {
            self.retry = self.retry.with_max_retries(retries);
        }
        self
    }
}

impl FromEnv for Config {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database: ConnectionParameters::from_env()?,
            retry: RetryConfig::from_env()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        temp_env::with_vars(
            [
                ("DB_HOST", Some("pg.local")),
                ("DB_NAME", Some("app")),
                ("DB_USER", Some("probe")),
                ("DB_PORT", None),
                ("DB_OPTIONS", None),
                ("DB_SESSION", None),
                ("DB_CONNECT_RETRIES", Some("1")),
                ("DB_RETRY_DELAY_MS", None),
                ("DB_RETRY_MAX_DELAY_MS", None),
            ],
            || {
                let config = Config::from_env().unwrap();
                assert_eq!(config.database.host(), "pg.local");
                assert_eq!(config.retry.max_retries, 1);

                let config = config.with_retries(Some(4));
                assert_eq!(config.retry.max_retries, 4);

                let config = config.with_retries(None);
                assert_eq!(config.retry.max_retries, 4);
            },
        );
    }

    #[test]
    fn test_config_requires_database_name() {
        temp_env::with_vars(
            [
                ("DB_HOST", Some("pg.local")),
                ("DB_NAME", None),
                ("DB_USER", Some("probe")),
            ],
            || {
                let err = Config::from_env().unwrap_err();
                assert!(err.to_string().contains("DB_NAME"));
            },
        );
    }
}
