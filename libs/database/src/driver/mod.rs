//! Driver interface consumed by backends
//!
//! A [`Driver`] opens [`Session`]s from a connection target, credentials and
//! an options map, and answers capability queries. Backends only talk to
//! servers through these traits.

mod options;
mod target;

#[cfg(feature = "runtime")]
mod orm;

pub use options::{DriverOptions, ERROR_MODE, ErrorMode, OptionValue};
#[cfg(feature = "config")]
pub(crate) use options::parse_pairs;
pub use target::ConnectionTarget;

#[cfg(feature = "runtime")]
pub use orm::{SeaOrmDriver, SeaOrmSession};

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::common::DriverError;

/// Server settings a session must carry, by setting name
pub type SessionSettings = BTreeMap<String, String>;

/// Extension name the PostgreSQL backend requires
pub const PGSQL_EXTENSION: &str = "pgsql";

/// Low-level database connectivity provider
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Driver: Send + Sync {
    /// Whether the generic driver runtime is present
    fn runtime_available(&self) -> bool;

    /// Whether a backend-specific extension (e.g. `pgsql`) is present
    fn extension_loaded(&self, extension: &str) -> bool;

    /// Open a session against `target`
    ///
    /// `settings` must be in effect on every server connection the session
    /// uses, including connections the driver replaces later on.
    async fn open(
        &self,
        target: &ConnectionTarget,
        user: &str,
        password: &str,
        options: &DriverOptions,
        settings: &SessionSettings,
    ) -> Result<Box<dyn Session>, DriverError>;
}

/// An open, stateful session bound to one connection
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Session: Send + Sync {
    /// First column of the first row, as text; `None` when no row came back
    async fn query_first_column(&self, sql: &str) -> Result<Option<String>, DriverError>;

    /// Whether `sql` returned at least one row; column values are not decoded
    async fn query_exists(&self, sql: &str) -> Result<bool, DriverError>;

    /// Execute a statement, returning the number of affected rows
    async fn execute(&self, sql: &str) -> Result<u64, DriverError>;

    /// Release the underlying connection; later calls fail with [`DriverError::Closed`]
    async fn close(&mut self) -> Result<(), DriverError>;
}
