//! Observability sink for failover activity
//!
//! The manager reports every selector flip, reconnect, and reinstatement
//! outcome through an injected sink instead of a process-wide logger, so
//! operators can correlate manager behavior with rotation activity and tests
//! can assert on the exact event sequence. Credentials never appear in
//! events.

use std::time::Duration;

use tracing::{error, info, warn};

use super::ActiveKey;

/// One observable state change or failure inside the manager
#[derive(Debug, Clone, PartialEq)]
pub enum FailoverEvent {
    /// A validated connection was established with the named key
    Connected { key: ActiveKey },
    /// A connection attempt with the named key failed
    ConnectFailed { key: ActiveKey, error: String },
    /// A data operation attempt failed with a retryable error
    OperationFailed { attempt: u32, error: String },
    /// The active selector changed
    SelectorFlipped { from: ActiveKey, to: ActiveKey },
    /// A backoff sleep was scheduled before the next attempt
    RetryScheduled { attempt: u32, delay: Duration },
    /// A routing error was passed through to the caller without retry
    RoutingErrorSurfaced { error: String },
    /// The stored primary credential was replaced
    PrimaryUpdated,
    /// A reinstatement probe succeeded and the live session moved to primary
    ReinstatementSucceeded,
    /// A reinstatement probe failed; the manager stays on secondary
    ReinstatementFailed { error: String },
    /// The live connection was torn down on request
    ConnectionClosed,
}

/// Consumer of manager events
pub trait EventSink: Send + Sync {
    fn record(&self, event: FailoverEvent);
}

/// Default sink: forwards to `tracing`
pub struct LogSink;

impl EventSink for LogSink {
    fn record(&self, event: FailoverEvent) {
        match event {
            FailoverEvent::Connected { key } => {
                info!("connected to store using {} key", key);
            }
            FailoverEvent::ConnectFailed { key, error } => {
                error!("failed to connect with {} key: {}", key, error);
            }
            FailoverEvent::OperationFailed { attempt, error } => {
                warn!("operation failed on attempt {}: {}", attempt + 1, error);
            }
            FailoverEvent::SelectorFlipped { from, to } => {
                warn!("switching active key: {} -> {}", from, to);
            }
            FailoverEvent::RetryScheduled { attempt, delay } => {
                info!(
                    "retrying in {:.2}s (after attempt {})",
                    delay.as_secs_f64(),
                    attempt + 1
                );
            }
            FailoverEvent::RoutingErrorSurfaced { error } => {
                error!("routing error, not retryable: {}", error);
            }
            FailoverEvent::PrimaryUpdated => {
                info!("primary key has been updated");
            }
            FailoverEvent::ReinstatementSucceeded => {
                info!("successfully switched back to primary key");
            }
            FailoverEvent::ReinstatementFailed { error } => {
                warn!("new primary key validation failed, staying on secondary: {}", error);
            }
            FailoverEvent::ConnectionClosed => {
                info!("store connection closed");
            }
        }
    }
}
