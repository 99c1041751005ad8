//! Session: the single live connection owned by the manager
//!
//! A session is a dumb connection holder. It knows how to tear down, rebuild,
//! and validate its one handle for a caller-supplied credential; retry and
//! credential-switch policy live entirely in the manager.

use tracing::warn;

use crate::client::{StoreConnection, StoreConnector};
use crate::config::Credential;
use crate::utils::StoreError;

/// Holds at most one validated connection at a time
pub struct Session<C: StoreConnector> {
    connector: C,
    conn: Option<C::Conn>,
}

impl<C: StoreConnector> Session<C> {
    /// A session with no live handle yet
    pub fn new(connector: C) -> Self {
        Self {
            connector,
            conn: None,
        }
    }

    /// Tear down any existing handle and build a validated replacement bound
    /// to `credential`.
    ///
    /// The new handle is stored only after a PING round trip succeeds, so the
    /// session is never left partially live: on any failure the previous
    /// handle is gone and no new one exists.
    pub fn connect(&mut self, credential: &Credential) -> Result<(), StoreError> {
        self.teardown();

        let mut conn = self.connector.connect(credential.reveal())?;
        conn.ping()?;
        self.conn = Some(conn);
        Ok(())
    }

    /// Validate `credential` on a throwaway connection without touching the
    /// live handle. The probe connection is always torn down before this
    /// returns, success or failure.
    pub fn probe(&self, credential: &Credential) -> Result<(), StoreError> {
        let mut conn = self.connector.connect(credential.reveal())?;
        let result = conn.ping();
        if let Err(close_err) = conn.close() {
            warn!("error closing probe connection: {}", close_err);
        }
        result
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    /// The live handle, if one exists
    pub fn handle(&mut self) -> Option<&mut C::Conn> {
        self.conn.as_mut()
    }

    /// Drop the live handle. Teardown errors are logged and ignored.
    pub fn teardown(&mut self) {
        if let Some(mut conn) = self.conn.take() {
            if let Err(close_err) = conn.close() {
                warn!("error closing existing store connection: {}", close_err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Connector whose connections can be told to fail PING or CLOSE
    struct FlakyConnector {
        fail_ping_for: Option<String>,
        closes: Arc<AtomicU32>,
    }

    struct FlakyConn {
        ping_fails: bool,
        closes: Arc<AtomicU32>,
    }

    impl StoreConnector for FlakyConnector {
        type Conn = FlakyConn;

        fn connect(&self, secret: &str) -> Result<FlakyConn, StoreError> {
            if secret == "rejected" {
                return Err(StoreError::Auth("WRONGPASS".to_string()));
            }
            Ok(FlakyConn {
                ping_fails: self.fail_ping_for.as_deref() == Some(secret),
                closes: Arc::clone(&self.closes),
            })
        }
    }

    impl StoreConnection for FlakyConn {
        fn ping(&mut self) -> Result<(), StoreError> {
            if self.ping_fails {
                Err(StoreError::Protocol("unexpected PING reply".to_string()))
            } else {
                Ok(())
            }
        }

        fn get(&mut self, _key: &str) -> Result<Option<String>, StoreError> {
            Ok(None)
        }

        fn set(&mut self, _key: &str, _value: &str) -> Result<(), StoreError> {
            Ok(())
        }

        fn expire(&mut self, _key: &str, _seconds: u64) -> Result<bool, StoreError> {
            Ok(true)
        }

        fn del(&mut self, _key: &str) -> Result<bool, StoreError> {
            Ok(false)
        }

        fn close(&mut self) -> Result<(), StoreError> {
            self.closes.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    fn connector() -> FlakyConnector {
        FlakyConnector {
            fail_ping_for: None,
            closes: Arc::new(AtomicU32::new(0)),
        }
    }

    #[test]
    fn connect_validates_with_ping() {
        let mut session = Session::new(FlakyConnector {
            fail_ping_for: Some("stale".to_string()),
            closes: Arc::new(AtomicU32::new(0)),
        });

        let err = session.connect(&Credential::new("stale")).unwrap_err();
        assert!(matches!(err, StoreError::Protocol(_)));
        assert!(!session.is_connected());
    }

    #[test]
    fn connect_replaces_previous_handle() {
        let conn = connector();
        let closes = Arc::clone(&conn.closes);
        let mut session = Session::new(conn);

        session.connect(&Credential::new("a")).unwrap();
        session.connect(&Credential::new("b")).unwrap();

        assert!(session.is_connected());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn rejected_credential_leaves_no_handle() {
        let mut session = Session::new(connector());

        let err = session.connect(&Credential::new("rejected")).unwrap_err();
        assert!(matches!(err, StoreError::Auth(_)));
        assert!(!session.is_connected());
    }

    #[test]
    fn probe_never_touches_live_handle() {
        let conn = connector();
        let closes = Arc::clone(&conn.closes);
        let mut session = Session::new(conn);
        session.connect(&Credential::new("live")).unwrap();

        session.probe(&Credential::new("candidate")).unwrap();
        assert!(session.is_connected());
        // The probe connection was closed, the live one was not
        assert_eq!(closes.load(Ordering::SeqCst), 1);

        assert!(session.probe(&Credential::new("rejected")).is_err());
        assert!(session.is_connected());
    }

    #[test]
    fn teardown_is_idempotent() {
        let conn = connector();
        let closes = Arc::clone(&conn.closes);
        let mut session = Session::new(conn);
        session.connect(&Credential::new("a")).unwrap();

        session.teardown();
        session.teardown();

        assert!(!session.is_connected());
        assert_eq!(closes.load(Ordering::SeqCst), 1);
    }
}
