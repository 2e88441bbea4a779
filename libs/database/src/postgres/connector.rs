use async_trait::async_trait;
use tracing::{debug, info, instrument, warn};

use super::BACKEND_NAME;
use crate::backend::DatabaseBackend;
use crate::common::{ConnectionError, DatabaseResult, DriverError};
use crate::driver::{
    ConnectionTarget, Driver, DriverOptions, ERROR_MODE, ErrorMode, PGSQL_EXTENSION,
    SessionSettings,
};
use crate::handle::ConnectionHandle;
use crate::params::ConnectionParameters;

/// Port used when the parameters leave it unset
pub const DEFAULT_PORT: u16 = 5432;

/// Query used to probe the server version
pub const VERSION_QUERY: &str = "SELECT VERSION()";

/// PostgreSQL implementation of [`DatabaseBackend`]
///
/// # Example
/// ```ignore
/// use db_connector::{ConnectionParameters, DatabaseBackend, PostgresConnector};
///
/// let connector = PostgresConnector::new();
/// if connector.is_supported() {
///     let params = ConnectionParameters::new("localhost", "app", "app", "secret");
///     let handle = connector.connect(&params).await?;
///     println!("{}", connector.version(&handle).await);
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct PostgresConnector<D> {
    driver: D,
}

#[cfg(feature = "runtime")]
impl PostgresConnector<crate::driver::SeaOrmDriver> {
    /// Connector backed by the sea-orm driver
    pub fn new() -> Self {
        Self::with_driver(crate::driver::SeaOrmDriver::new())
    }
}

impl<D: Driver> PostgresConnector<D> {
    pub fn with_driver(driver: D) -> Self {
        Self { driver }
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Target descriptor for `params`, defaulting the port to 5432
    pub fn target(params: &ConnectionParameters) -> Result<ConnectionTarget, DriverError> {
        ConnectionTarget::new(params.host(), params.port_or(DEFAULT_PORT), params.database())
    }
}

/// Caller options plus the mandatory `error_mode = raise`
///
/// The mandatory flag always wins. A caller-supplied different mode is
/// replaced and logged.
pub fn merge_driver_options(options: &DriverOptions) -> DriverOptions {
    let mut merged = options.clone();
    if let Some(previous) = merged.insert(ERROR_MODE, ErrorMode::Raise) {
        let was_raise = previous
            .as_text()
            .and_then(|mode| mode.parse::<ErrorMode>().ok())
            == Some(ErrorMode::Raise);
        if !was_raise {
            warn!(requested = %previous, "Ignoring caller error_mode; PostgreSQL sessions always raise");
        }
    }
    merged
}

/// Check session settings before they reach the server
///
/// Names are limited to identifier characters (dots allowed for extension
/// settings). Values may be anything but NUL.
pub fn validate_session_settings(settings: &SessionSettings) -> Result<(), DriverError> {
    for (name, value) in settings {
        let mut chars = name.chars();
        let valid_name = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.');
        if !valid_name {
            return Err(DriverError::InvalidOption {
                key: name.to_string(),
                reason: "not a valid session setting name".to_string(),
            });
        }
        if value.contains('\0') {
            return Err(DriverError::InvalidOption {
                key: name.to_string(),
                reason: "value contains a NUL byte".to_string(),
            });
        }
    }
    Ok(())
}

#[async_trait]
impl<D: Driver> DatabaseBackend for PostgresConnector<D> {
    type Handle = ConnectionHandle;

    fn name(&self) -> &'static str {
        BACKEND_NAME
    }

    fn is_supported(&self) -> bool {
        self.driver.runtime_available() && self.driver.extension_loaded(PGSQL_EXTENSION)
    }

    #[instrument(skip_all, fields(host = %params.host(), database = %params.database()))]
    async fn connect(&self, params: &ConnectionParameters) -> Result<ConnectionHandle, ConnectionError> {
        let fail = |source| ConnectionError::new(BACKEND_NAME, params.host(), source);

        let target = Self::target(params).map_err(fail)?;
        let options = merge_driver_options(params.options());
        let settings = params.session_settings();
        validate_session_settings(settings).map_err(fail)?;

        debug!(%target, settings = settings.len(), "Connecting");
        let session = self
            .driver
            .open(&target, params.user(), params.password(), &options, settings)
            .await
            .map_err(|e| {
                warn!(%target, error = %e, "Connection attempt failed");
                fail(e)
            })?;

        info!(%target, "Connected to PostgreSQL");
        Ok(ConnectionHandle::new(target, session))
    }

    async fn try_version(&self, handle: &ConnectionHandle) -> DatabaseResult<String> {
        handle
            .session()
            .query_first_column(VERSION_QUERY)
            .await?
            .ok_or(DriverError::NoRows.into())
    }

    async fn close(&self, handle: ConnectionHandle) -> DatabaseResult<()> {
        let target = handle.target().to_string();
        handle.close().await?;
        debug!(%target, "Closed PostgreSQL session");
        Ok(())
    }
}
