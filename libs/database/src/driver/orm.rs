use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{
    ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr, QueryResult, Statement,
};
use tracing::{debug, warn};

use super::{
    ConnectionTarget, Driver, DriverOptions, ERROR_MODE, ErrorMode, OptionValue, PGSQL_EXTENSION,
    Session, SessionSettings,
};
use crate::common::DriverError;

/// Production driver backed by sea-orm over sqlx
///
/// Each session is a sea-orm connection pool, one connection wide unless
/// `max_connections` says otherwise. Session settings travel as startup
/// parameters (`-c name=value`), so the server applies them to every
/// connection the pool opens, including replacements after `max_lifetime`,
/// `idle_timeout` or a broken connection.
///
/// Recognized options:
/// - `error_mode`: `raise`, `warn` or `silent` (default `silent`)
/// - `connect_timeout`, `acquire_timeout`, `idle_timeout`, `max_lifetime`: seconds
/// - `max_connections`, `min_connections`: pool bounds (default 1 / 1)
/// - `sqlx_logging`: log every statement
/// - `application_name`, `sslmode`: passed to the server in the connection URL
/// - `search_path`: schema search path
#[derive(Debug, Clone, Copy, Default)]
pub struct SeaOrmDriver;

impl SeaOrmDriver {
    pub fn new() -> Self {
        Self
    }

    /// Translate a target, credentials, options and session settings into
    /// sea-orm `ConnectOptions`
    pub fn connect_options(
        target: &ConnectionTarget,
        user: &str,
        password: &str,
        options: &DriverOptions,
        settings: &SessionSettings,
    ) -> Result<ConnectOptions, DriverError> {
        let mut query_params = Vec::new();
        let mut max_connections = 1;
        let mut min_connections = 1;
        let mut durations: Vec<(&str, Duration)> = Vec::new();
        let mut sqlx_logging = false;
        let mut search_path = None;

        for (key, value) in options.iter() {
            match key {
                ERROR_MODE => {
                    // Interpreted by the session
                    options.error_mode()?;
                }
                "connect_timeout" | "acquire_timeout" | "idle_timeout" | "max_lifetime" => {
                    let secs = positive_integer(key, value)?;
                    durations.push((key, Duration::from_secs(secs)));
                }
                "max_connections" => max_connections = pool_size(key, value)?,
                "min_connections" => min_connections = pool_size(key, value)?,
                "sqlx_logging" => {
                    sqlx_logging = value.as_bool().ok_or_else(|| invalid(key, "expected a boolean"))?
                }
                "application_name" | "sslmode" => {
                    let text = value.as_text().ok_or_else(|| invalid(key, "expected text"))?;
                    query_params.push((key, text.to_string()));
                }
                "search_path" => {
                    let text = value.as_text().ok_or_else(|| invalid(key, "expected text"))?;
                    search_path = Some(text.to_string());
                }
                _ => return Err(invalid(key, "unknown option")),
            }
        }

        if min_connections > max_connections {
            return Err(invalid(
                "min_connections",
                "must not exceed max_connections",
            ));
        }

        let url = connection_url(target, user, password, &query_params);
        let mut opt = ConnectOptions::new(url);
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .sqlx_logging(sqlx_logging);

        for (key, duration) in durations {
            match key {
                "connect_timeout" => opt.connect_timeout(duration),
                "acquire_timeout" => opt.acquire_timeout(duration),
                "idle_timeout" => opt.idle_timeout(duration),
                _ => opt.max_lifetime(duration),
            };
        }
        if let Some(path) = search_path {
            opt.set_schema_search_path(path);
        }
        if !settings.is_empty() {
            startup_settings(&mut opt, settings)?;
        }

        Ok(opt)
    }
}

#[async_trait]
impl Driver for SeaOrmDriver {
    fn runtime_available(&self) -> bool {
        true
    }

    fn extension_loaded(&self, extension: &str) -> bool {
        extension.eq_ignore_ascii_case(PGSQL_EXTENSION) && cfg!(feature = "postgres")
    }

    async fn open(
        &self,
        target: &ConnectionTarget,
        user: &str,
        password: &str,
        options: &DriverOptions,
        settings: &SessionSettings,
    ) -> Result<Box<dyn Session>, DriverError> {
        if !self.extension_loaded(PGSQL_EXTENSION) {
            return Err(DriverError::ExtensionMissing(PGSQL_EXTENSION));
        }

        let error_mode = options.error_mode()?;
        let connect_options = Self::connect_options(target, user, password, options, settings)?;

        debug!(%target, %error_mode, settings = settings.len(), "Opening sea-orm session");
        let connection = Database::connect(connect_options).await?;

        Ok(Box::new(SeaOrmSession::new(connection, error_mode)))
    }
}

/// A sea-orm connection plus the error mode it was opened with
pub struct SeaOrmSession {
    connection: Option<DatabaseConnection>,
    error_mode: ErrorMode,
}

impl SeaOrmSession {
    pub fn new(connection: DatabaseConnection, error_mode: ErrorMode) -> Self {
        Self {
            connection: Some(connection),
            error_mode,
        }
    }

    pub fn error_mode(&self) -> ErrorMode {
        self.error_mode
    }

    fn connection(&self) -> Result<&DatabaseConnection, DriverError> {
        self.connection.as_ref().ok_or(DriverError::Closed)
    }

    async fn fetch_first_row(&self, sql: &str) -> Result<Option<QueryResult>, DriverError> {
        let connection = self.connection()?;
        let stmt = Statement::from_string(connection.get_database_backend(), sql.to_owned());
        Ok(connection.query_one_raw(stmt).await?)
    }

    async fn fetch_first_column(&self, sql: &str) -> Result<Option<String>, DriverError> {
        match self.fetch_first_row(sql).await? {
            Some(row) => Ok(Some(first_column_text(&row)?)),
            None => Ok(None),
        }
    }

    async fn fetch_exists(&self, sql: &str) -> Result<bool, DriverError> {
        Ok(self.fetch_first_row(sql).await?.is_some())
    }

    async fn run(&self, sql: &str) -> Result<u64, DriverError> {
        let connection = self.connection()?;
        let exec = connection.execute_unprepared(sql).await?;
        Ok(exec.rows_affected())
    }

    /// Apply the error mode: only `raise` lets a failure through
    fn report<T>(
        &self,
        sql: &str,
        result: Result<T, DriverError>,
        fallback: T,
    ) -> Result<T, DriverError> {
        match (result, self.error_mode) {
            (Ok(value), _) => Ok(value),
            (Err(e), ErrorMode::Raise) => Err(e),
            (Err(e), ErrorMode::Warn) => {
                warn!(error = %e, sql, "Statement failed");
                Ok(fallback)
            }
            (Err(_), ErrorMode::Silent) => Ok(fallback),
        }
    }
}

#[async_trait]
impl Session for SeaOrmSession {
    async fn query_first_column(&self, sql: &str) -> Result<Option<String>, DriverError> {
        let result = self.fetch_first_column(sql).await;
        self.report(sql, result, None)
    }

    async fn query_exists(&self, sql: &str) -> Result<bool, DriverError> {
        let result = self.fetch_exists(sql).await;
        self.report(sql, result, false)
    }

    async fn execute(&self, sql: &str) -> Result<u64, DriverError> {
        let result = self.run(sql).await;
        self.report(sql, result, 0)
    }

    async fn close(&mut self) -> Result<(), DriverError> {
        if let Some(connection) = self.connection.take() {
            connection.close().await?;
        }
        Ok(())
    }
}

/// Column 0 as text
///
/// sqlx decodes strictly by SQL type, so integer, boolean and float columns
/// are read as such and formatted. The text decoding error is kept for
/// anything else.
fn first_column_text(row: &QueryResult) -> Result<String, DbErr> {
    let text_err = match row.try_get_by_index::<String>(0) {
        Ok(text) => return Ok(text),
        Err(e) => e,
    };

    if let Ok(n) = row.try_get_by_index::<i64>(0) {
        return Ok(n.to_string());
    }
    if let Ok(n) = row.try_get_by_index::<i32>(0) {
        return Ok(n.to_string());
    }
    if let Ok(n) = row.try_get_by_index::<i16>(0) {
        return Ok(n.to_string());
    }
    if let Ok(b) = row.try_get_by_index::<bool>(0) {
        return Ok(b.to_string());
    }
    if let Ok(f) = row.try_get_by_index::<f64>(0) {
        return Ok(f.to_string());
    }

    Err(text_err)
}

/// Send session settings as startup parameters on every new connection
#[cfg(feature = "postgres")]
fn startup_settings(opt: &mut ConnectOptions, settings: &SessionSettings) -> Result<(), DriverError> {
    let startup: Vec<(String, String)> = settings
        .iter()
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    opt.map_sqlx_postgres_opts(move |pg| pg.options(startup.clone()));
    Ok(())
}

#[cfg(not(feature = "postgres"))]
fn startup_settings(_opt: &mut ConnectOptions, _settings: &SessionSettings) -> Result<(), DriverError> {
    Err(DriverError::ExtensionMissing(PGSQL_EXTENSION))
}

/// Build a `postgres://` URL; user, password and database are percent-encoded
fn connection_url(
    target: &ConnectionTarget,
    user: &str,
    password: &str,
    query_params: &[(&str, String)],
) -> String {
    let host = if target.host().contains(':') && !target.host().starts_with('[') {
        format!("[{}]", target.host())
    } else {
        target.host().to_string()
    };

    let credentials = if password.is_empty() {
        urlencoding::encode(user).into_owned()
    } else {
        format!(
            "{}:{}",
            urlencoding::encode(user),
            urlencoding::encode(password)
        )
    };

    let mut url = format!(
        "postgres://{}@{}:{}/{}",
        credentials,
        host,
        target.port(),
        urlencoding::encode(target.database())
    );

    for (i, (key, value)) in query_params.iter().enumerate() {
        url.push(if i == 0 { '?' } else { '&' });
        url.push_str(key);
        url.push('=');
        url.push_str(&urlencoding::encode(value));
    }

    url
}

fn invalid(key: &str, reason: &str) -> DriverError {
    DriverError::InvalidOption {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn positive_integer(key: &str, value: &OptionValue) -> Result<u64, DriverError> {
    match value.as_integer() {
        Some(n) if n > 0 => Ok(n as u64),
        _ => Err(invalid(key, "expected a positive integer")),
    }
}

fn pool_size(key: &str, value: &OptionValue) -> Result<u32, DriverError> {
    value
        .as_integer()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| invalid(key, "expected a non-negative integer"))
}
