use std::fmt;
use std::str::FromStr;

use crate::common::DriverError;

/// Where a driver should connect: host, port and database name
///
/// Renders as `host=<host>; port=<port>; dbname=<database>` and parses back
/// from the same form. Credentials are passed to the driver separately and
/// never appear here, so the descriptor is safe to log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionTarget {
    host: String,
    port: u16,
    database: String,
}

impl ConnectionTarget {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        database: impl Into<String>,
    ) -> Result<Self, DriverError> {
        let host = host.into();
        let database = database.into();

        if host.trim().is_empty() {
            return Err(DriverError::InvalidTarget("host is empty".to_string()));
        }
        for (name, value) in [("host", &host), ("dbname", &database)] {
            if value.contains(';') {
                return Err(DriverError::InvalidTarget(format!(
                    "{} must not contain ';'",
                    name
                )));
            }
        }

        Ok(Self {
            host,
            port,
            database,
        })
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn database(&self) -> &str {
        &self.database
    }
}

impl fmt::Display for ConnectionTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "host={}; port={}; dbname={}",
            self.host, self.port, self.database
        )
    }
}

impl FromStr for ConnectionTarget {
    type Err = DriverError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let mut host = None;
        let mut port = None;
        let mut database = None;

        for part in raw.split(';').map(str::trim).filter(|part| !part.is_empty()) {
            let (key, value) = part
                .split_once('=')
                .ok_or_else(|| DriverError::InvalidTarget(format!("malformed segment '{}'", part)))?;
            let value = value.trim();
            match key.trim() {
                "host" => host = Some(value.to_string()),
                "port" => {
                    port = Some(value.parse::<u16>().map_err(|e| {
                        DriverError::InvalidTarget(format!("invalid port '{}': {}", value, e))
                    })?)
                }
                "dbname" => database = Some(value.to_string()),
                other => {
                    return Err(DriverError::InvalidTarget(format!(
                        "unknown key '{}'",
                        other
                    )))
                }
            }
        }

        let missing = |key: &str| DriverError::InvalidTarget(format!("missing '{}'", key));
        Self::new(
            host.ok_or_else(|| missing("host"))?,
            port.ok_or_else(|| missing("port"))?,
            database.ok_or_else(|| missing("dbname"))?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_format() {
        let target = ConnectionTarget::new("db.example.com", 6432, "inventory").unwrap();
        assert_eq!(
            target.to_string(),
            "host=db.example.com; port=6432; dbname=inventory"
        );
    }

    #[test]
    fn test_parse_display_output() {
        let target: ConnectionTarget = "host=localhost; port=5432; dbname=app".parse().unwrap();
        assert_eq!(target.host(), "localhost");
        assert_eq!(target.port(), 5432);
        assert_eq!(target.database(), "app");
    }

    #[test]
    fn test_parse_tolerates_spacing_and_order() {
        let target: ConnectionTarget = " dbname = app ;host=::1;port=15432; ".parse().unwrap();
        assert_eq!(target.host(), "::1");
        assert_eq!(target.port(), 15432);
        assert_eq!(target.database(), "app");
    }

    #[test]
    fn test_parse_rejects_missing_and_unknown_keys() {
        assert!("host=localhost; dbname=app".parse::<ConnectionTarget>().is_err());
        assert!("host=localhost; port=5432; dbname=app; user=admin"
            .parse::<ConnectionTarget>()
            .is_err());
        assert!("host=localhost; port=abc; dbname=app"
            .parse::<ConnectionTarget>()
            .is_err());
    }

    #[test]
    fn test_new_rejects_empty_host_and_separator() {
        assert!(ConnectionTarget::new("  ", 5432, "app").is_err());
        assert!(ConnectionTarget::new("localhost", 5432, "app;drop").is_err());
    }
}
