//! Store client boundary traits
//!
//! The failover manager only ever sees these two traits plus the closed
//! [`StoreError`] taxonomy. The real implementation speaks RESP over TCP/TLS
//! ([`super::resp_store`]); tests substitute scripted fakes.

use crate::utils::StoreError;

/// One authenticated connection to the store
pub trait StoreConnection: Send {
    /// Liveness no-op round trip
    fn ping(&mut self) -> Result<(), StoreError>;

    /// GET. `None` when the key does not exist.
    fn get(&mut self, key: &str) -> Result<Option<String>, StoreError>;

    /// SET
    fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError>;

    /// EXPIRE. `false` when the key does not exist.
    fn expire(&mut self, key: &str, seconds: u64) -> Result<bool, StoreError>;

    /// DEL. `true` when a key was removed.
    fn del(&mut self, key: &str) -> Result<bool, StoreError>;

    /// Tear down the connection. Idempotent best-effort.
    fn close(&mut self) -> Result<(), StoreError>;
}

/// Builds authenticated connections from configured target coordinates plus a
/// caller-supplied secret
pub trait StoreConnector: Send + Sync {
    type Conn: StoreConnection;

    /// Establish and authenticate a new connection using `secret`
    fn connect(&self, secret: &str) -> Result<Self::Conn, StoreError>;
}
