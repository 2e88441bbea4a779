use std::time::Instant;

use tracing::debug;

use crate::common::DatabaseError;
use crate::handle::ConnectionHandle;

/// Check PostgreSQL session health
///
/// Executes `SELECT 1` on the handle's session.
///
/// # Returns
/// * `Ok(())` if the server answered
/// * `Err(DatabaseError::HealthCheckFailed)` otherwise
pub async fn check_health(handle: &ConnectionHandle) -> Result<(), DatabaseError> {
    check_health_with_query(handle, "SELECT 1").await
}

/// Check PostgreSQL session health with a custom query
///
/// The query must return at least one row. Column values are not read, so
/// any result shape works.
///
/// # Example
/// ```ignore
/// use db_connector::postgres::check_health_with_query;
///
/// check_health_with_query(&handle, "SELECT 1 FROM pg_tables LIMIT 1").await?;
/// ```
pub async fn check_health_with_query(
    handle: &ConnectionHandle,
    query: &str,
) -> Result<(), DatabaseError> {
    debug!(server = %handle.target(), query, "Running PostgreSQL health check");

    match handle.session().query_exists(query).await {
        Ok(true) => {
            debug!("PostgreSQL health check passed");
            Ok(())
        }
        Ok(false) => Err(DatabaseError::HealthCheckFailed(format!(
            "query '{}' returned no rows",
            query
        ))),
        Err(e) => Err(DatabaseError::HealthCheckFailed(format!(
            "query '{}' failed: {}",
            query, e
        ))),
    }
}

/// Health check result for detailed status reporting
#[derive(Debug, Clone, serde::Serialize)]
pub struct HealthStatus {
    pub healthy: bool,

    /// Error message if unhealthy
    pub message: Option<String>,

    pub response_time_ms: u64,
}

impl HealthStatus {
    pub fn healthy(response_time_ms: u64) -> Self {
        Self {
            healthy: true,
            message: None,
            response_time_ms,
        }
    }

    pub fn unhealthy(message: String, response_time_ms: u64) -> Self {
        Self {
            healthy: false,
            message: Some(message),
            response_time_ms,
        }
    }
}

/// Check health and report the outcome with response time instead of failing
pub async fn check_health_detailed(handle: &ConnectionHandle) -> HealthStatus {
    let start = Instant::now();
    let result = check_health(handle).await;
    let elapsed = start.elapsed().as_millis() as u64;

    match result {
        Ok(()) => HealthStatus::healthy(elapsed),
        Err(e) => HealthStatus::unhealthy(e.to_string(), elapsed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::DriverError;
    use crate::driver::{ConnectionTarget, MockSession};

    fn handle(session: MockSession) -> ConnectionHandle {
        let target = ConnectionTarget::new("localhost", 5432, "postgres").unwrap();
        ConnectionHandle::new(target, Box::new(session))
    }

    #[test]
    fn test_health_status_constructors() {
        let status = HealthStatus::healthy(42);
        assert!(status.healthy);
        assert_eq!(status.response_time_ms, 42);
        assert!(status.message.is_none());

        let status = HealthStatus::unhealthy("connection reset".to_string(), 100);
        assert!(!status.healthy);
        assert_eq!(status.message.as_deref(), Some("connection reset"));
    }

    #[tokio::test]
    async fn test_check_health_runs_select_one() {
        let mut session = MockSession::new();
        session
            .expect_query_exists()
            .withf(|sql| sql == "SELECT 1")
            .times(1)
            .returning(|_| Ok(true));
        session.expect_query_first_column().never();

        assert!(check_health(&handle(session)).await.is_ok());
    }

    #[tokio::test]
    async fn test_check_health_with_query_no_rows() {
        let mut session = MockSession::new();
        session.expect_query_exists().returning(|_| Ok(false));

        let err = check_health_with_query(&handle(session), "SELECT 1 WHERE false")
            .await
            .unwrap_err();
        assert!(matches!(err, DatabaseError::HealthCheckFailed(_)));
        assert!(err.to_string().contains("no rows"));
    }

    #[tokio::test]
    async fn test_check_health_detailed_reports_failure() {
        let mut session = MockSession::new();
        session
            .expect_query_exists()
            .returning(|_| Err(DriverError::Closed));

        let status = check_health_detailed(&handle(session)).await;
        assert!(!status.healthy);
        assert!(status.message.unwrap().contains("session is closed"));
    }
}
