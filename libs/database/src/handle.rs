use std::fmt;

use crate::common::DriverError;
use crate::driver::{ConnectionTarget, Session};

/// An open session bound to one database connection
///
/// Only produced by a successful `connect`, so a handle is never observed half
/// initialized. Dropping it releases the driver session; [`close`](Self::close)
/// does the same and reports failures.
pub struct ConnectionHandle {
    target: ConnectionTarget,
    session: Box<dyn Session>,
}

impl ConnectionHandle {
    pub(crate) fn new(target: ConnectionTarget, session: Box<dyn Session>) -> Self {
        Self { target, session }
    }

    /// Target this handle was opened against
    pub fn target(&self) -> &ConnectionTarget {
        &self.target
    }

    pub fn session(&self) -> &dyn Session {
        self.session.as_ref()
    }

    pub async fn close(mut self) -> Result<(), DriverError> {
        self.session.close().await
    }
}

impl fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionHandle")
            .field("target", &self.target.to_string())
            .finish_non_exhaustive()
    }
}
