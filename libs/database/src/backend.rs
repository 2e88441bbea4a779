use async_trait::async_trait;
use tracing::debug;

use crate::common::{ConnectionError, DatabaseResult};
use crate::params::ConnectionParameters;

/// Version reported when the server version cannot be determined
pub const UNKNOWN_VERSION: &str = "unknown";

/// A database backend the generic database layer can be configured with
///
/// One implementation per server type. Callers probe [`is_supported`] before
/// offering a backend, then `connect` once and use the returned handle.
///
/// [`is_supported`]: DatabaseBackend::is_supported
#[async_trait]
pub trait DatabaseBackend: Send + Sync {
    /// Open session type produced by `connect`
    type Handle: Send + Sync;

    /// Human-readable backend name, e.g. "PostgreSQL"
    fn name(&self) -> &'static str;

    /// Whether everything this backend needs is present in the current build.
    /// Performs no I/O.
    fn is_supported(&self) -> bool;

    /// Open a session with the server described by `params`
    async fn connect(&self, params: &ConnectionParameters) -> Result<Self::Handle, ConnectionError>;

    /// Ask the server for its version string
    async fn try_version(&self, handle: &Self::Handle) -> DatabaseResult<String>;

    /// Best-effort version string; any failure yields [`UNKNOWN_VERSION`]
    async fn version(&self, handle: &Self::Handle) -> String {
        self.try_version(handle).await.unwrap_or_else(|e| {
            debug!(backend = self.name(), error = %e, "Version probe failed");
            UNKNOWN_VERSION.to_string()
        })
    }

    /// Release a session
    async fn close(&self, handle: Self::Handle) -> DatabaseResult<()>;
}
