//! Error types for valkey-key-rotation
//!
//! The underlying store surfaces failures as io errors and RESP `-ERR`
//! strings. Both are translated exactly once, at the client boundary, into
//! the closed [`StoreError`] taxonomy so that the failover logic never
//! inspects library- or protocol-specific detail.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Failure kinds reported by the store client boundary
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("connection failure: {0}")]
    Connection(String),

    #[error("authentication rejected: {0}")]
    Auth(String),

    #[error("protocol failure: {0}")]
    Protocol(String),

    #[error("routing failure: {0}")]
    Routing(String),

    #[error("operation timed out: {0}")]
    Timeout(String),
}

impl StoreError {
    /// Classify an io error from the socket layer.
    ///
    /// Read/write deadline expiry shows up as `TimedOut` (or `WouldBlock` on
    /// some platforms); everything else at this layer is a connection-level
    /// failure.
    pub fn from_io(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock => {
                StoreError::Timeout(err.to_string())
            }
            _ => StoreError::Connection(err.to_string()),
        }
    }

    /// Classify a server `-ERR` reply string.
    ///
    /// NOAUTH / WRONGPASS / "invalid password" mean the presented credential
    /// was rejected. CROSSSLOT / MOVED / ASK are key-placement errors that no
    /// amount of re-authentication can fix. Anything else is treated as a
    /// generic protocol failure.
    pub fn from_server_error(msg: &str) -> Self {
        let lower = msg.to_ascii_lowercase();
        if msg.starts_with("NOAUTH")
            || msg.starts_with("WRONGPASS")
            || lower.contains("invalid password")
        {
            StoreError::Auth(msg.to_string())
        } else if msg.starts_with("CROSSSLOT") || msg.starts_with("MOVED") || msg.starts_with("ASK")
        {
            StoreError::Routing(msg.to_string())
        } else {
            StoreError::Protocol(msg.to_string())
        }
    }

    /// True for failure kinds that a credential switch or reconnect may fix
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            StoreError::Connection(_) | StoreError::Auth(_) | StoreError::Protocol(_)
        )
    }
}

/// Failures surfaced by the failover manager
#[derive(Error, Debug)]
pub enum ManagerError {
    /// Both credentials were rejected at startup. Fatal.
    #[error("initialization failed: primary: {primary}; secondary: {secondary}")]
    Initialization {
        primary: StoreError,
        secondary: StoreError,
    },

    /// The retry budget was spent without a successful attempt
    #[error("retries exhausted after {attempts} attempts (elapsed backoff {backoff:?}): {source}")]
    RetriesExhausted {
        attempts: u32,
        backoff: Duration,
        source: StoreError,
    },

    /// A failure that is never retried (routing errors)
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type Result<T> = std::result::Result<T, ManagerError>;
