use std::collections::BTreeMap;
use std::fmt;

use crate::driver::{DriverOptions, OptionValue};

#[cfg(feature = "config")]
use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_parse_optional, env_required};

/// Everything needed to open a connection
///
/// Built once with [`ConnectionParameters::new`] and the `with_*` methods, then
/// only read. `Debug` output never shows the password.
///
/// # Example
///
/// ```
/// use db_connector::ConnectionParameters;
///
/// let params = ConnectionParameters::new("localhost", "app", "app_user", "secret")
///     .with_port(6432)
///     .with_option("connect_timeout", 5_i64)
///     .with_session_setting("timezone", "UTC");
///
/// assert_eq!(params.port(), Some(6432));
/// assert!(!format!("{:?}", params).contains("secret"));
/// ```
#[derive(Clone, Default, PartialEq, Eq)]
pub struct ConnectionParameters {
    host: String,
    port: Option<u16>,
    database: String,
    user: String,
    password: String,
    options: DriverOptions,
    session: BTreeMap<String, String>,
}

impl ConnectionParameters {
    pub fn new(
        host: impl Into<String>,
        database: impl Into<String>,
        user: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            host: host.into(),
            database: database.into(),
            user: user.into(),
            password: password.into(),
            ..Self::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = Some(port);
        self
    }

    /// Add a driver-specific option
    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.options.insert(key, value);
        self
    }

    /// Replace all driver-specific options
    pub fn with_options(mut self, options: DriverOptions) -> Self {
        self.options = options;
        self
    }

    /// Add a server setting carried by every connection of the session
    pub fn with_session_setting(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.session.insert(name.into(), value.into());
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port as given; backends substitute their default when `None`
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub fn port_or(&self, default: u16) -> u16 {
        self.port.unwrap_or(default)
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    pub fn options(&self) -> &DriverOptions {
        &self.options
    }

    pub fn session_settings(&self) -> &BTreeMap<String, String> {
        &self.session
    }
}

impl fmt::Debug for ConnectionParameters {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParameters")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("options", &self.options)
            .field("session", &self.session)
            .finish()
    }
}

/// Load ConnectionParameters from environment variables
///
/// Environment variables:
/// - `DB_HOST` (required)
/// - `DB_PORT` (optional, backend default when unset)
/// - `DB_NAME` (required)
/// - `DB_USER` (required)
/// - `DB_PASSWORD` (optional, default: empty)
/// - `DB_OPTIONS` (optional) - driver options as `key=value,key=value`
/// - `DB_SESSION` (optional) - session settings as `key=value,key=value`
#[cfg(feature = "config")]
impl FromEnv for ConnectionParameters {
    fn from_env() -> Result<Self, ConfigError> {
        let mut params = Self::new(
            env_required("DB_HOST")?,
            env_required("DB_NAME")?,
            env_required("DB_USER")?,
            env_or_default("DB_PASSWORD", ""),
        );
        params.port = env_parse_optional("DB_PORT")?;

        if let Some(raw) = env_optional("DB_OPTIONS") {
            params.options = raw.parse().map_err(|e| ConfigError::ParseError {
                key: "DB_OPTIONS".to_string(),
                details: format!("{}", e),
            })?;
        }

        if let Some(raw) = env_optional("DB_SESSION") {
            params.session = crate::driver::parse_pairs(&raw)
                .map_err(|e| ConfigError::ParseError {
                    key: "DB_SESSION".to_string(),
                    details: format!("{}", e),
                })?
                .into_iter()
                .collect();
        }

        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_leaves_port_unset() {
        let params = ConnectionParameters::new("localhost", "app", "user", "pw");
        assert_eq!(params.port(), None);
        assert_eq!(params.port_or(5432), 5432);
        assert!(params.options().is_empty());
        assert!(params.session_settings().is_empty());
    }

    #[test]
    fn test_builder_methods() {
        let params = ConnectionParameters::new("db", "app", "user", "pw")
            .with_port(6543)
            .with_option("connect_timeout", 5_i64)
            .with_session_setting("search_path", "app");

        assert_eq!(params.port_or(5432), 6543);
        assert_eq!(
            params.options().get("connect_timeout"),
            Some(&OptionValue::Integer(5))
        );
        assert_eq!(
            params.session_settings().get("search_path").map(String::as_str),
            Some("app")
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let params = ConnectionParameters::new("db", "app", "user", "hunter2");
        let debug = format!("{:?}", params);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
        assert!(debug.contains("db"));
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_env_minimal() {
        temp_env::with_vars(
            [
                ("DB_HOST", Some("pg.local")),
                ("DB_NAME", Some("app")),
                ("DB_USER", Some("app_user")),
                ("DB_PORT", None),
                ("DB_PASSWORD", None),
                ("DB_OPTIONS", None),
                ("DB_SESSION", None),
            ],
            || {
                let params = ConnectionParameters::from_env().unwrap();
                assert_eq!(params.host(), "pg.local");
                assert_eq!(params.database(), "app");
                assert_eq!(params.user(), "app_user");
                assert_eq!(params.password(), "");
                assert_eq!(params.port(), None);
            },
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_env_full() {
        temp_env::with_vars(
            [
                ("DB_HOST", Some("pg.local")),
                ("DB_NAME", Some("app")),
                ("DB_USER", Some("app_user")),
                ("DB_PORT", Some("6432")),
                ("DB_PASSWORD", Some("s3cret")),
                ("DB_OPTIONS", Some("connect_timeout=5,sslmode=require")),
                ("DB_SESSION", Some("timezone=UTC, search_path=app")),
            ],
            || {
                let params = ConnectionParameters::from_env().unwrap();
                assert_eq!(params.port(), Some(6432));
                assert_eq!(params.password(), "s3cret");
                assert_eq!(params.options().len(), 2);
                assert_eq!(
                    params.options().get("sslmode"),
                    Some(&OptionValue::Text("require".to_string()))
                );
                assert_eq!(params.session_settings().len(), 2);
                assert_eq!(params.session_settings()["timezone"], "UTC");
            },
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_env_missing_host() {
        temp_env::with_vars(
            [
                ("DB_HOST", None),
                ("DB_NAME", Some("app")),
                ("DB_USER", Some("app_user")),
            ],
            || {
                let err = ConnectionParameters::from_env().unwrap_err();
                assert!(err.to_string().contains("DB_HOST"));
            },
        );
    }

    #[cfg(feature = "config")]
    #[test]
    fn test_from_env_invalid_port_and_options() {
        temp_env::with_vars(
            [
                ("DB_HOST", Some("pg.local")),
                ("DB_NAME", Some("app")),
                ("DB_USER", Some("app_user")),
                ("DB_PORT", Some("70000")),
            ],
            || {
                let err = ConnectionParameters::from_env().unwrap_err();
                assert!(err.to_string().contains("DB_PORT"));
            },
        );

        temp_env::with_vars(
            [
                ("DB_HOST", Some("pg.local")),
                ("DB_NAME", Some("app")),
                ("DB_USER", Some("app_user")),
                ("DB_PORT", None),
                ("DB_OPTIONS", Some("connect_timeout")),
            ],
            || {
                let err = ConnectionParameters::from_env().unwrap_err();
                assert!(err.to_string().contains("DB_OPTIONS"));
            },
        );
    }
}
