//! PostgreSQL backend
//!
//! [`PostgresConnector`] opens sessions through a [`Driver`](crate::driver::Driver),
//! forcing the driver into `raise` error mode, and probes the server version.

mod connector;
mod health;

pub use connector::{DEFAULT_PORT, PostgresConnector, VERSION_QUERY, merge_driver_options};
pub use health::{HealthStatus, check_health, check_health_detailed, check_health_with_query};

/// Backend name used in logs and errors
pub const BACKEND_NAME: &str = "PostgreSQL";
