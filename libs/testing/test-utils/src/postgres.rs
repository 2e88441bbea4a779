//! PostgreSQL test infrastructure
//!
//! Provides a `TestPostgres` helper that starts a PostgreSQL container and
//! exposes the coordinates a connector needs.

use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::postgres::Postgres;

/// Image tag used for test servers
pub const POSTGRES_TAG: &str = "17-alpine";

/// Running PostgreSQL container
///
/// The container is stopped and removed when this struct is dropped.
pub struct TestPostgres {
    #[allow(dead_code)]
    container: ContainerAsync<Postgres>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl TestPostgres {
    /// Start a container and wait until it accepts connections
    ///
    /// # Example
    ///
    /// ```no_run
    /// use test_utils::TestPostgres;
    ///
    /// # async fn example() {
    /// let pg = TestPostgres::new().await;
    /// println!("{}:{}", pg.host, pg.port);
    /// # }
    /// ```
    pub async fn new() -> Self {
        Self::with_credentials("postgres", "postgres", "postgres").await
    }

    /// Start a container with a specific user, password and database
    pub async fn with_credentials(user: &str, password: &str, database: &str) -> Self {
        let container = Postgres::default()
            .with_user(user)
            .with_password(password)
            .with_db_name(database)
            .with_tag(POSTGRES_TAG)
            .start()
            .await
            .expect("Failed to start Postgres container");

        let host = container
            .get_host()
            .await
            .expect("Failed to get container host")
            .to_string();
        let port = container
            .get_host_port_ipv4(5432)
            .await
            .expect("Failed to get host port");

        tracing::info!(%host, port, "Test PostgreSQL ready");

        Self {
            container,
            host,
            port,
            user: user.to_string(),
            password: password.to_string(),
            database: database.to_string(),
        }
    }
}

impl Drop for TestPostgres {
    fn drop(&mut self) {
        tracing::debug!(port = self.port, "Cleaning up test PostgreSQL container");
    }
}
