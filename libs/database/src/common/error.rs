/// Errors reported by a driver implementation
///
/// Drivers translate their native failures into this type so backends can
/// wrap them without knowing which driver produced them.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// A backend-specific driver extension is missing
    #[error("driver extension '{0}' is not loaded")]
    ExtensionMissing(&'static str),

    /// The connection target descriptor could not be understood
    #[error("invalid connection target: {0}")]
    InvalidTarget(String),

    /// A driver option had an unknown key or an unusable value
    #[error("invalid driver option '{key}': {reason}")]
    InvalidOption { key: String, reason: String },

    /// The session was already closed
    #[error("session is closed")]
    Closed,

    /// A query that must return a row returned none, such as the version query
    #[error("query returned no rows")]
    NoRows,

    /// Socket-level failures
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Errors from the sea-orm / sqlx runtime
    #[cfg(feature = "runtime")]
    #[error(transparent)]
    Orm(#[from] sea_orm::DbErr),
}

impl DriverError {
    /// Whether the same call may succeed if repeated later
    ///
    /// Network and pool-acquisition failures are transient; bad targets,
    /// bad options and missing driver support are not.
    pub fn is_transient(&self) -> bool {
        match self {
            DriverError::Io(_) => true,
            #[cfg(feature = "runtime")]
            DriverError::Orm(err) => matches!(
                err,
                sea_orm::DbErr::Conn(_) | sea_orm::DbErr::ConnectionAcquire(_)
            ),
            _ => false,
        }
    }
}

/// Failure to open a session with a database server
///
/// Carries the target host for context and wraps the driver error. Credentials
/// are never part of the message.
#[derive(Debug, thiserror::Error)]
#[error("failed to connect to {backend} server at {host}: {source}")]
pub struct ConnectionError {
    backend: &'static str,
    host: String,
    #[source]
    source: DriverError,
}

impl ConnectionError {
    pub fn new(backend: &'static str, host: impl Into<String>, source: DriverError) -> Self {
        Self {
            backend,
            host: host.into(),
            source,
        }
    }

    /// Host the connection attempt was made against
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn backend(&self) -> &'static str {
        self.backend
    }

    /// The underlying driver error
    pub fn driver_error(&self) -> &DriverError {
        &self.source
    }

    pub fn into_driver_error(self) -> DriverError {
        self.source
    }

    /// See [`DriverError::is_transient`]
    pub fn is_transient(&self) -> bool {
        self.source.is_transient()
    }
}

/// Unified database error type for all database operations
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    /// Opening a connection failed
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// A driver call on an open session failed
    #[error("Driver error: {0}")]
    Driver(#[from] DriverError),

    /// Health check failed
    #[error("Health check failed: {0}")]
    HealthCheckFailed(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

#[cfg(feature = "config")]
impl From<core_config::ConfigError> for DatabaseError {
    fn from(err: core_config::ConfigError) -> Self {
        DatabaseError::ConfigError(err.to_string())
    }
}

/// Result type alias for database operations
pub type DatabaseResult<T> = Result<T, DatabaseError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;
    use std::io;

    #[test]
    fn test_connection_error_mentions_host_and_cause() {
        let err = ConnectionError::new(
            "PostgreSQL",
            "db.internal",
            DriverError::Io(io::Error::new(io::ErrorKind::ConnectionRefused, "connection refused")),
        );

        let message = err.to_string();
        assert!(message.contains("db.internal"));
        assert!(message.contains("PostgreSQL"));
        assert!(message.contains("connection refused"));
        assert_eq!(err.host(), "db.internal");
    }

    #[test]
    fn test_connection_error_source_is_driver_error() {
        let err = ConnectionError::new("PostgreSQL", "localhost", DriverError::Closed);
        let source = err.source().expect("source should be set");
        assert!(source.downcast_ref::<DriverError>().is_some());
    }

    #[test]
    fn test_transient_classification() {
        let refused = DriverError::Io(io::Error::from(io::ErrorKind::ConnectionRefused));
        assert!(refused.is_transient());
        assert!(ConnectionError::new("PostgreSQL", "db", refused).is_transient());

        assert!(!DriverError::InvalidTarget("host is empty".into()).is_transient());
        assert!(!DriverError::ExtensionMissing("pgsql").is_transient());
        assert!(
            !DriverError::InvalidOption {
                key: "sslmode".into(),
                reason: "expected text".into()
            }
            .is_transient()
        );
    }

    #[cfg(feature = "runtime")]
    #[test]
    fn test_orm_connection_errors_are_transient() {
        use sea_orm::{ConnAcquireErr, DbErr};

        assert!(DriverError::Orm(DbErr::ConnectionAcquire(ConnAcquireErr::Timeout)).is_transient());
        assert!(!DriverError::Orm(DbErr::Custom("syntax error".into())).is_transient());
    }

    #[test]
    fn test_database_error_from_connection_error_is_transparent() {
        let err: DatabaseError =
            ConnectionError::new("PostgreSQL", "10.0.0.7", DriverError::NoRows).into();
        assert!(err.to_string().starts_with("failed to connect to PostgreSQL server at 10.0.0.7"));
    }
}
