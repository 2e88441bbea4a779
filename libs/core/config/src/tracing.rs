use crate::{env_optional, ConfigError, Environment};
use std::str::FromStr;
use tracing::{debug, info};
use tracing_subscriber::{prelude::*, EnvFilter};

/// Install color-eyre with a project-standard configuration.
///
/// Call this early in main() before any fallible operations. Safe to call
/// multiple times.
pub fn install_color_eyre() {
    let _ = color_eyre::config::HookBuilder::default()
        .display_location_section(true)
        .display_env_section(false)
        .install();
}

/// Shape of emitted log lines
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LogFormat {
    /// One JSON object per event, for log collectors
    Json,
    /// Multi-line human-readable output
    Pretty,
    /// Single-line human-readable output
    Compact,
}

impl LogFormat {
    /// `LOG_FORMAT` if set, otherwise JSON in production and pretty elsewhere
    pub fn from_env(environment: &Environment) -> Result<Self, ConfigError> {
        match env_optional("LOG_FORMAT") {
            Some(raw) => raw.parse(),
            None if environment.is_production() => Ok(LogFormat::Json),
            None => Ok(LogFormat::Pretty),
        }
    }
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(LogFormat::Json),
            "pretty" => Ok(LogFormat::Pretty),
            "compact" => Ok(LogFormat::Compact),
            other => Err(ConfigError::ParseError {
                key: "LOG_FORMAT".to_string(),
                details: format!("expected json, pretty or compact, got '{}'", other),
            }),
        }
    }
}

/// Default filter directive when `RUST_LOG` is not set
pub fn default_filter(environment: &Environment) -> &'static str {
    if environment.is_production() {
        "warn"
    } else {
        "info,db_connector=debug,sea_orm=warn,sqlx=warn"
    }
}

/// Initialize tracing for `environment`, with error span capture.
///
/// The format comes from [`LogFormat::from_env`]; an unusable `LOG_FORMAT`
/// falls back to the environment default. `RUST_LOG` overrides
/// [`default_filter`]. `tracing_error::ErrorLayer` is always registered so
/// eyre reports carry span traces.
///
/// Logs go to stderr so command output on stdout stays machine-readable.
/// Calling this more than once is harmless; later calls are skipped.
pub fn init_tracing(environment: &Environment) {
    let format = LogFormat::from_env(environment).unwrap_or_else(|e| {
        eprintln!("{}; using the default log format", e);
        if environment.is_production() {
            LogFormat::Json
        } else {
            LogFormat::Pretty
        }
    });
    init_tracing_with_format(environment, format);
}

/// Like [`init_tracing`] with an explicit format
pub fn init_tracing_with_format(environment: &Environment, format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(environment)));

    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);
    let fmt_layer = match format {
        LogFormat::Json => fmt_layer
            .json()
            .with_target(false)
            .flatten_event(true)
            .boxed(),
        LogFormat::Pretty => fmt_layer
            .with_file(false)
            .with_line_number(false)
            .pretty()
            .boxed(),
        LogFormat::Compact => fmt_layer.compact().boxed(),
    };

    let result = tracing_subscriber::registry()
        .with(fmt_layer)
        .with(tracing_error::ErrorLayer::default())
        .with(filter)
        .try_init();

    match result {
        Ok(()) => info!(?environment, ?format, "Tracing initialized"),
        // Already initialized (common in tests)
        Err(_) => debug!("Tracing already initialized, skipping"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_is_quieter_in_production() {
        assert_eq!(default_filter(&Environment::Production), "warn");
        assert!(default_filter(&Environment::Development).contains("db_connector=debug"));
    }

    #[test]
    fn test_log_format_follows_environment() {
        temp_env::with_var_unset("LOG_FORMAT", || {
            assert_eq!(
                LogFormat::from_env(&Environment::Production).unwrap(),
                LogFormat::Json
            );
            assert_eq!(
                LogFormat::from_env(&Environment::Development).unwrap(),
                LogFormat::Pretty
            );
        });
    }

    #[test]
    fn test_log_format_override() {
        temp_env::with_var("LOG_FORMAT", Some("Compact"), || {
            assert_eq!(
                LogFormat::from_env(&Environment::Production).unwrap(),
                LogFormat::Compact
            );
        });

        temp_env::with_var("LOG_FORMAT", Some("xml"), || {
            let err = LogFormat::from_env(&Environment::Development).unwrap_err();
            assert!(err.to_string().contains("LOG_FORMAT"));
        });
    }

    #[test]
    fn test_init_tracing_multiple_calls() {
        init_tracing(&Environment::Development);
        init_tracing(&Environment::Development);
        init_tracing_with_format(&Environment::Production, LogFormat::Json);
    }
}
