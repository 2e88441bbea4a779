//! Database backend connectors, with a PostgreSQL implementation
//!
//! A generic database layer picks a [`DatabaseBackend`], checks
//! [`is_supported`](DatabaseBackend::is_supported), then connects with
//! [`ConnectionParameters`]. Backends reach servers only through the
//! [`driver::Driver`] interface.
//!
//! # Features
//!
//! - `postgres` (default) - PostgreSQL driver extension (sqlx-postgres)
//! - `runtime` - generic driver runtime (sea-orm); implied by `postgres`
//! - `config` - `core_config::FromEnv` for parameters and retry policy
//! - `all` - all of the above
//!
//! # Examples
//!
//! ## Connect and read the server version
//!
//! ```ignore
//! use db_connector::{ConnectionParameters, DatabaseBackend, PostgresConnector};
//!
//! let connector = PostgresConnector::new();
//! let params = ConnectionParameters::new("localhost", "app", "app", "secret")
//!     .with_option("connect_timeout", 5_i64);
//!
//! let handle = connector.connect(&params).await?;
//! println!("{}", connector.version(&handle).await);
//! connector.close(handle).await?;
//! ```
//!
//! ## Lifecycle through `Database`
//!
//! ```ignore
//! use db_connector::{Database, PostgresConnector};
//! use core_config::FromEnv;
//!
//! let db = Database::new(PostgresConnector::new(), ConnectionParameters::from_env()?);
//! let db = db.connect().await?;
//! let version = db.version().await;
//! db.close().await?;
//! ```

pub mod backend;
pub mod common;
pub mod database;
pub mod diagnostics;
pub mod driver;
pub mod handle;
pub mod params;
pub mod postgres;

pub use backend::{DatabaseBackend, UNKNOWN_VERSION};
pub use common::{ConnectionError, DatabaseError, DatabaseResult, DriverError};
pub use database::{Connected, Database, Unconnected};
pub use diagnostics::{Diagnostics, diagnose};
pub use handle::ConnectionHandle;
pub use params::ConnectionParameters;
pub use postgres::PostgresConnector;
