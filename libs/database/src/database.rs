//! Connection lifecycle over any [`DatabaseBackend`]
//!
//! `Database<B, Unconnected>` becomes `Database<B, Connected<_>>` only through
//! [`Database::connect`], which consumes the unconnected value, so each
//! instance connects at most once and the handle it owns is never shared.

use crate::backend::DatabaseBackend;
use crate::common::{ConnectionError, DatabaseResult};
use crate::params::ConnectionParameters;

/// State before `connect`
#[derive(Debug)]
pub struct Unconnected {
    params: ConnectionParameters,
}

/// State after a successful `connect`
#[derive(Debug)]
pub struct Connected<H> {
    handle: H,
}

/// A backend plus its connection state
#[derive(Debug)]
pub struct Database<B, S> {
    backend: B,
    state: S,
}

impl<B: DatabaseBackend> Database<B, Unconnected> {
    pub fn new(backend: B, params: ConnectionParameters) -> Self {
        Self {
            backend,
            state: Unconnected { params },
        }
    }

    pub fn params(&self) -> &ConnectionParameters {
        &self.state.params
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_supported(&self) -> bool {
        self.backend.is_supported()
    }

    pub async fn connect(self) -> Result<Database<B, Connected<B::Handle>>, ConnectionError> {
        let handle = self.backend.connect(&self.state.params).await?;
        Ok(Database {
            backend: self.backend,
            state: Connected { handle },
        })
    }
}

impl<B: DatabaseBackend> Database<B, Connected<B::Handle>> {
    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn handle(&self) -> &B::Handle {
        &self.state.handle
    }

    pub async fn try_version(&self) -> DatabaseResult<String> {
        self.backend.try_version(&self.state.handle).await
    }

    /// Server version, or `"unknown"` when it cannot be read
    pub async fn version(&self) -> String {
        self.backend.version(&self.state.handle).await
    }

    pub async fn close(self) -> DatabaseResult<()> {
        self.backend.close(self.state.handle).await
    }
}
