//! Common utilities shared across all database backends

pub mod error;
pub mod retry;

pub use error::{ConnectionError, DatabaseError, DatabaseResult, DriverError};
pub use retry::{Backoff, RetryConfig, connect_with_retry, retry, retry_if, retry_with_backoff};
