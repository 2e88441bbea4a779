//! Never-failing diagnostic report for a backend and a set of parameters

use std::time::Instant;

use serde::Serialize;
use tracing::debug;

use crate::backend::{DatabaseBackend, UNKNOWN_VERSION};
use crate::params::ConnectionParameters;

/// What a diagnostics panel shows about a database
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub backend: &'static str,
    pub supported: bool,
    pub connected: bool,
    pub version: String,
    pub response_time_ms: u64,
    /// Why the backend is unusable, when it is
    pub message: Option<String>,
}

/// Probe support, connect, read the version and disconnect
///
/// Failures end up in the report rather than being returned. No connection is
/// attempted for an unsupported backend.
pub async fn diagnose<B: DatabaseBackend>(backend: &B, params: &ConnectionParameters) -> Diagnostics {
    let start = Instant::now();
    let mut report = Diagnostics {
        backend: backend.name(),
        supported: backend.is_supported(),
        connected: false,
        version: UNKNOWN_VERSION.to_string(),
        response_time_ms: 0,
        message: None,
    };

    if !report.supported {
        report.message = Some(format!("{} support is not available in this build", backend.name()));
        return report;
    }

    match backend.connect(params).await {
        Ok(handle) => {
            report.connected = true;
            report.version = backend.version(&handle).await;
            if let Err(e) = backend.close(handle).await {
                debug!(error = %e, "Closing diagnostics session failed");
                report.message = Some(format!("close failed: {}", e));
            }
        }
        Err(e) => report.message = Some(e.to_string()),
    }

    report.response_time_ms = start.elapsed().as_millis() as u64;
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::DriverError;
    use crate::driver::{MockDriver, MockSession, Session};
    use crate::postgres::PostgresConnector;

    fn params() -> ConnectionParameters {
        ConnectionParameters::new("pg.example", "app", "app", "pw")
    }

    fn supported_driver() -> MockDriver {
        let mut driver = MockDriver::new();
        driver.expect_runtime_available().return_const(true);
        driver.expect_extension_loaded().return_const(true);
        driver
    }

    #[tokio::test]
    async fn test_unsupported_backend_is_not_contacted() {
        let mut driver = MockDriver::new();
        driver.expect_runtime_available().return_const(false);
        driver.expect_extension_loaded().return_const(true);
        driver.expect_open().never();

        let report = diagnose(&PostgresConnector::with_driver(driver), &params()).await;
        assert!(!report.supported);
        assert!(!report.connected);
        assert_eq!(report.version, "unknown");
        assert!(report.message.unwrap().contains("PostgreSQL"));
    }

    #[tokio::test]
    async fn test_connection_failure_is_reported() {
        let mut driver = supported_driver();
        driver
            .expect_open()
            .returning(|_, _, _, _, _| Err(DriverError::Io(std::io::Error::other("timed out"))));

        let report = diagnose(&PostgresConnector::with_driver(driver), &params()).await;
        assert!(report.supported);
        assert!(!report.connected);
        assert_eq!(report.version, "unknown");
        let message = report.message.unwrap();
        assert!(message.contains("pg.example"));
        assert!(message.contains("timed out"));
    }

    #[tokio::test]
    async fn test_successful_report_serializes() {
        let mut session = MockSession::new();
        session
            .expect_query_first_column()
            .returning(|_| Ok(Some("PostgreSQL 17.0".to_string())));
        session.expect_close().times(1).returning(|| Ok(()));

        let mut driver = supported_driver();
        driver
            .expect_open()
            .return_once(move |_, _, _, _, _| Ok(Box::new(session) as Box<dyn Session>));

        let report = diagnose(&PostgresConnector::with_driver(driver), &params()).await;
        assert!(report.connected);
        assert_eq!(report.version, "PostgreSQL 17.0");
        assert!(report.message.is_none());

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["backend"], "PostgreSQL");
        assert_eq!(json["version"], "PostgreSQL 17.0");
        assert_eq!(json["connected"], true);
    }
}
