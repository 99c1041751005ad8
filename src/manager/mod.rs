//! Failover manager
//!
//! Owns two credential slots (primary, secondary), the selector saying which
//! one is active, and the single live [`Session`]. Every data operation runs
//! through a retry loop that switches to the secondary credential when the
//! primary is rejected, reconnects after transient connection failures with
//! exponential backoff, and passes routing errors straight through.

pub mod events;
pub mod session;
pub mod sleeper;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::client::{RespConnector, StoreConnection, StoreConnector};
use crate::config::{Credential, ManagerConfig, RetryPolicy};
use crate::utils::{ManagerError, StoreError};

use self::events::{EventSink, FailoverEvent, LogSink};
use self::session::Session;
use self::sleeper::{Sleeper, ThreadSleeper};

/// Which credential the live session is (or will be) built with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActiveKey {
    Primary,
    Secondary,
}

impl fmt::Display for ActiveKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActiveKey::Primary => f.write_str("primary"),
            ActiveKey::Secondary => f.write_str("secondary"),
        }
    }
}

/// Everything that must mutate together: both credentials, the selector, and
/// the session. Guarded by one mutex so a selector flip and its reconnect are
/// atomic with respect to other callers.
struct ManagerState<C: StoreConnector> {
    primary: Credential,
    secondary: Credential,
    active: ActiveKey,
    session: Session<C>,
}

impl<C: StoreConnector> ManagerState<C> {
    /// Rebuild the live session with whichever credential is active
    fn reconnect_active(&mut self) -> Result<(), StoreError> {
        let Self {
            primary,
            secondary,
            active,
            session,
        } = self;
        let credential = match active {
            ActiveKey::Primary => primary,
            ActiveKey::Secondary => secondary,
        };
        session.connect(credential)
    }
}

/// Connection manager that stays available across a credential rotation
pub struct FailoverManager<C: StoreConnector> {
    state: Mutex<ManagerState<C>>,
    retry: RetryPolicy,
    sink: Arc<dyn EventSink>,
    sleeper: Box<dyn Sleeper>,
}

impl FailoverManager<RespConnector> {
    /// Connect to the configured endpoint, starting with the primary key
    pub fn open(
        config: ManagerConfig,
        primary: Credential,
        secondary: Credential,
    ) -> Result<Self, ManagerError> {
        Self::open_with_sink(config, primary, secondary, Arc::new(LogSink))
    }

    /// Like [`open`](Self::open), with a caller-supplied event sink
    pub fn open_with_sink(
        config: ManagerConfig,
        primary: Credential,
        secondary: Credential,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, ManagerError> {
        let retry = config.retry;
        Self::connect(RespConnector::new(config), primary, secondary, retry, sink)
    }
}

impl<C: StoreConnector> FailoverManager<C> {
    /// Build a manager over any connector and perform the initial connect.
    ///
    /// Tries the primary credential first; if that fails with a recoverable
    /// kind, flips to the secondary and retries once. If both are rejected
    /// there is no credential left to try and the error is fatal.
    pub fn connect(
        connector: C,
        primary: Credential,
        secondary: Credential,
        retry: RetryPolicy,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, ManagerError> {
        Self::with_parts(
            connector,
            primary,
            secondary,
            retry,
            sink,
            Box::new(ThreadSleeper),
        )
    }

    fn with_parts(
        connector: C,
        primary: Credential,
        secondary: Credential,
        retry: RetryPolicy,
        sink: Arc<dyn EventSink>,
        sleeper: Box<dyn Sleeper>,
    ) -> Result<Self, ManagerError> {
        let mut session = Session::new(connector);
        let mut active = ActiveKey::Primary;

        if let Err(primary_err) = session.connect(&primary) {
            sink.record(FailoverEvent::ConnectFailed {
                key: ActiveKey::Primary,
                error: primary_err.to_string(),
            });

            if !primary_err.is_recoverable() {
                return Err(ManagerError::Store(primary_err));
            }

            sink.record(FailoverEvent::SelectorFlipped {
                from: ActiveKey::Primary,
                to: ActiveKey::Secondary,
            });
            active = ActiveKey::Secondary;

            if let Err(secondary_err) = session.connect(&secondary) {
                sink.record(FailoverEvent::ConnectFailed {
                    key: ActiveKey::Secondary,
                    error: secondary_err.to_string(),
                });
                return Err(ManagerError::Initialization {
                    primary: primary_err,
                    secondary: secondary_err,
                });
            }
        }

        sink.record(FailoverEvent::Connected { key: active });

        Ok(Self {
            state: Mutex::new(ManagerState {
                primary,
                secondary,
                active,
                session,
            }),
            retry,
            sink,
            sleeper,
        })
    }

    /// The currently active credential slot
    pub fn active_key(&self) -> ActiveKey {
        self.state.lock().active
    }

    /// Whether a validated live handle exists right now
    pub fn is_connected(&self) -> bool {
        self.state.lock().session.is_connected()
    }

    /// Run one unit of work against the live handle, retrying with credential
    /// failover per the configured policy.
    ///
    /// The selector flips at most once per call: the eager primary→secondary
    /// switch on the first failure. Routing errors are never retried.
    pub fn execute_with_failover<T>(
        &self,
        mut op: impl FnMut(&mut C::Conn) -> Result<T, StoreError>,
    ) -> Result<T, ManagerError> {
        let mut last_error: Option<StoreError> = None;
        let mut total_backoff = Duration::ZERO;

        for attempt in 0..self.retry.max_attempts {
            // Critical section: attempt, classification, selector flip, and
            // reconnect all happen under the state lock. Backoff sleeps do
            // not.
            let failure = {
                let mut state = self.state.lock();

                let result = match self.ensure_connected(&mut state) {
                    Ok(()) => match state.session.handle() {
                        Some(conn) => op(conn),
                        None => Err(StoreError::Connection("no live handle".to_string())),
                    },
                    Err(connect_err) => Err(connect_err),
                };

                let err = match result {
                    Ok(value) => return Ok(value),
                    Err(err) => err,
                };

                if matches!(err, StoreError::Routing(_)) {
                    self.sink.record(FailoverEvent::RoutingErrorSurfaced {
                        error: err.to_string(),
                    });
                    return Err(ManagerError::Store(err));
                }

                self.sink.record(FailoverEvent::OperationFailed {
                    attempt,
                    error: err.to_string(),
                });

                // Try the rotation hypothesis before paying any backoff cost
                if attempt == 0 && err.is_recoverable() && state.active == ActiveKey::Primary {
                    state.active = ActiveKey::Secondary;
                    self.sink.record(FailoverEvent::SelectorFlipped {
                        from: ActiveKey::Primary,
                        to: ActiveKey::Secondary,
                    });

                    match state.reconnect_active() {
                        Ok(()) => {
                            self.sink.record(FailoverEvent::Connected {
                                key: ActiveKey::Secondary,
                            });
                            last_error = Some(err);
                        }
                        Err(connect_err) => {
                            self.sink.record(FailoverEvent::ConnectFailed {
                                key: ActiveKey::Secondary,
                                error: connect_err.to_string(),
                            });
                            last_error = Some(connect_err);
                        }
                    }
                    continue;
                }

                err
            };

            // Timeouts ride out the backoff on the existing handle; the
            // other kinds get a fresh connection after the sleep
            let reconnect_after_sleep = failure.is_recoverable();
            last_error = Some(failure);

            if self.retry.is_final_attempt(attempt) {
                break;
            }

            let delay = self.retry.delay_for(attempt);
            self.sink
                .record(FailoverEvent::RetryScheduled { attempt, delay });
            total_backoff += delay;
            self.sleeper.sleep(delay);

            if reconnect_after_sleep {
                let mut state = self.state.lock();
                let key = state.active;
                match state.reconnect_active() {
                    Ok(()) => self.sink.record(FailoverEvent::Connected { key }),
                    Err(connect_err) => {
                        self.sink.record(FailoverEvent::ConnectFailed {
                            key,
                            error: connect_err.to_string(),
                        });
                        last_error = Some(connect_err);
                    }
                }
            }
        }

        let source = last_error
            .unwrap_or_else(|| StoreError::Connection("no attempts were made".to_string()));
        Err(ManagerError::RetriesExhausted {
            attempts: self.retry.max_attempts,
            backoff: total_backoff,
            source,
        })
    }

    fn ensure_connected(&self, state: &mut ManagerState<C>) -> Result<(), StoreError> {
        if state.session.is_connected() {
            return Ok(());
        }
        let key = state.active;
        match state.reconnect_active() {
            Ok(()) => {
                self.sink.record(FailoverEvent::Connected { key });
                Ok(())
            }
            Err(err) => {
                self.sink.record(FailoverEvent::ConnectFailed {
                    key,
                    error: err.to_string(),
                });
                Err(err)
            }
        }
    }

    /// Write a value, optionally with a TTL in seconds.
    ///
    /// SET and EXPIRE run inside one retried unit of work, so a retried write
    /// re-applies the same value and TTL and the end state matches a single
    /// successful write.
    pub fn write(&self, key: &str, value: &str, ttl: Option<u64>) -> Result<(), ManagerError> {
        self.execute_with_failover(|conn| {
            conn.set(key, value)?;
            if let Some(seconds) = ttl {
                conn.expire(key, seconds)?;
            }
            Ok(())
        })
    }

    /// Read a value. `None` when the key does not exist.
    pub fn read(&self, key: &str) -> Result<Option<String>, ManagerError> {
        self.execute_with_failover(|conn| conn.get(key))
    }

    /// Delete a key. `true` when a key was removed.
    pub fn delete(&self, key: &str) -> Result<bool, ManagerError> {
        self.execute_with_failover(|conn| conn.del(key))
    }

    /// Replace the stored primary credential after an out-of-band rotation.
    ///
    /// The replacement is unconditional. If the manager is currently running
    /// on the secondary, the new primary is validated on a throwaway probe
    /// connection first; only if the probe succeeds does the live session
    /// move back to primary. A failed probe is swallowed (reported to the
    /// sink) and the manager stays on secondary: availability takes
    /// precedence over reinstatement.
    pub fn update_primary_credential(&self, new_primary: Credential) {
        let mut state = self.state.lock();
        state.primary = new_primary;
        self.sink.record(FailoverEvent::PrimaryUpdated);

        if state.active != ActiveKey::Secondary {
            return;
        }

        if let Err(probe_err) = state.session.probe(&state.primary) {
            self.sink.record(FailoverEvent::ReinstatementFailed {
                error: probe_err.to_string(),
            });
            return;
        }

        state.active = ActiveKey::Primary;
        self.sink.record(FailoverEvent::SelectorFlipped {
            from: ActiveKey::Secondary,
            to: ActiveKey::Primary,
        });

        match state.reconnect_active() {
            Ok(()) => self.sink.record(FailoverEvent::ReinstatementSucceeded),
            Err(rebuild_err) => {
                // The probe just passed, so this is rare. Fall back to the
                // secondary rather than hold a selector pointing at a dead
                // session.
                self.sink.record(FailoverEvent::ConnectFailed {
                    key: ActiveKey::Primary,
                    error: rebuild_err.to_string(),
                });
                state.active = ActiveKey::Secondary;
                self.sink.record(FailoverEvent::SelectorFlipped {
                    from: ActiveKey::Primary,
                    to: ActiveKey::Secondary,
                });
                let key = state.active;
                match state.reconnect_active() {
                    Ok(()) => self.sink.record(FailoverEvent::Connected { key }),
                    Err(err) => {
                        // Next data operation will reconnect implicitly
                        self.sink.record(FailoverEvent::ConnectFailed {
                            key,
                            error: err.to_string(),
                        });
                    }
                }
            }
        }
    }

    /// Tear down the live connection
    pub fn close(&self) {
        let mut state = self.state.lock();
        state.session.teardown();
        self.sink.record(FailoverEvent::ConnectionClosed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{HashMap, HashSet, VecDeque};

    const PRIMARY: &str = "primary-key";
    const SECONDARY: &str = "secondary-key";

    /// Shared backing state for the fake store
    #[derive(Default)]
    struct StoreState {
        good_secrets: HashSet<String>,
        data: HashMap<String, (String, Option<u64>)>,
        /// Scripted outcome per data operation call, consumed front-first;
        /// an empty queue (or a `None` entry) means the call succeeds
        op_script: VecDeque<Option<StoreError>>,
        /// Secrets presented to `connect`, in order, including rejected ones
        connects: Vec<String>,
        set_calls: u32,
        expire_calls: u32,
    }

    #[derive(Clone)]
    struct FakeConnector(Arc<Mutex<StoreState>>);

    struct FakeConn(Arc<Mutex<StoreState>>);

    impl StoreConnector for FakeConnector {
        type Conn = FakeConn;

        fn connect(&self, secret: &str) -> Result<FakeConn, StoreError> {
            let mut state = self.0.lock();
            state.connects.push(secret.to_string());
            if state.good_secrets.contains(secret) {
                Ok(FakeConn(Arc::clone(&self.0)))
            } else {
                Err(StoreError::Auth(
                    "WRONGPASS invalid username-password pair".to_string(),
                ))
            }
        }
    }

    impl FakeConn {
        fn scripted_failure(&self) -> Option<StoreError> {
            self.0.lock().op_script.pop_front().flatten()
        }
    }

    impl StoreConnection for FakeConn {
        fn ping(&mut self) -> Result<(), StoreError> {
            Ok(())
        }

        fn get(&mut self, key: &str) -> Result<Option<String>, StoreError> {
            if let Some(err) = self.scripted_failure() {
                return Err(err);
            }
            Ok(self.0.lock().data.get(key).map(|(v, _)| v.clone()))
        }

        fn set(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
            if let Some(err) = self.scripted_failure() {
                return Err(err);
            }
            let mut state = self.0.lock();
            state.set_calls += 1;
            state.data.insert(key.to_string(), (value.to_string(), None));
            Ok(())
        }

        fn expire(&mut self, key: &str, seconds: u64) -> Result<bool, StoreError> {
            if let Some(err) = self.scripted_failure() {
                return Err(err);
            }
            let mut state = self.0.lock();
            state.expire_calls += 1;
            match state.data.get_mut(key) {
                Some(entry) => {
                    entry.1 = Some(seconds);
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        fn del(&mut self, key: &str) -> Result<bool, StoreError> {
            if let Some(err) = self.scripted_failure() {
                return Err(err);
            }
            Ok(self.0.lock().data.remove(key).is_some())
        }

        fn close(&mut self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    struct RecordingSink(Mutex<Vec<FailoverEvent>>);

    impl EventSink for RecordingSink {
        fn record(&self, event: FailoverEvent) {
            self.0.lock().push(event);
        }
    }

    #[derive(Clone)]
    struct RecordingSleeper(Arc<Mutex<Vec<Duration>>>);

    impl Sleeper for RecordingSleeper {
        fn sleep(&self, duration: Duration) {
            self.0.lock().push(duration);
        }
    }

    struct Harness {
        manager: FailoverManager<FakeConnector>,
        store: Arc<Mutex<StoreState>>,
        events: Arc<RecordingSink>,
        sleeps: Arc<Mutex<Vec<Duration>>>,
    }

    const BASE: Duration = Duration::from_millis(500);

    fn try_harness(
        good_secrets: &[&str],
        op_script: Vec<Option<StoreError>>,
    ) -> Result<Harness, ManagerError> {
        let store = Arc::new(Mutex::new(StoreState {
            good_secrets: good_secrets.iter().map(|s| s.to_string()).collect(),
            op_script: op_script.into(),
            ..StoreState::default()
        }));
        let events = Arc::new(RecordingSink(Mutex::new(Vec::new())));
        let sleeps = Arc::new(Mutex::new(Vec::new()));

        let manager = FailoverManager::with_parts(
            FakeConnector(Arc::clone(&store)),
            Credential::new(PRIMARY),
            Credential::new(SECONDARY),
            RetryPolicy::new(3, BASE),
            Arc::clone(&events) as Arc<dyn EventSink>,
            Box::new(RecordingSleeper(Arc::clone(&sleeps))),
        )?;

        Ok(Harness {
            manager,
            store,
            events,
            sleeps,
        })
    }

    fn harness(good_secrets: &[&str], op_script: Vec<Option<StoreError>>) -> Harness {
        try_harness(good_secrets, op_script).expect("manager construction failed")
    }

    fn flip_count(events: &RecordingSink) -> usize {
        events
            .0
            .lock()
            .iter()
            .filter(|e| matches!(e, FailoverEvent::SelectorFlipped { .. }))
            .count()
    }

    fn conn_err() -> Option<StoreError> {
        Some(StoreError::Connection("connection reset".to_string()))
    }

    fn timeout_err() -> Option<StoreError> {
        Some(StoreError::Timeout("read deadline exceeded".to_string()))
    }

    #[test]
    fn plain_write_and_read_round_trip() {
        let h = harness(&[PRIMARY, SECONDARY], vec![]);

        h.manager.write("k", "v", Some(60)).unwrap();
        assert_eq!(h.manager.read("k").unwrap(), Some("v".to_string()));
        assert_eq!(
            h.store.lock().data.get("k"),
            Some(&("v".to_string(), Some(60)))
        );
        assert!(h.manager.delete("k").unwrap());
        assert_eq!(h.manager.read("k").unwrap(), None);
        assert_eq!(h.manager.active_key(), ActiveKey::Primary);
    }

    #[test]
    fn write_retried_across_failures_is_idempotent() {
        // SET fails twice with connection errors that resolve on the final
        // attempt; the end state must equal a single write of (v, ttl)
        let h = harness(&[PRIMARY, SECONDARY], vec![conn_err(), conn_err()]);

        h.manager.write("k", "v", Some(30)).unwrap();

        let store = h.store.lock();
        assert_eq!(store.data.get("k"), Some(&("v".to_string(), Some(30))));
        assert_eq!(store.set_calls, 1);
        assert_eq!(store.expire_calls, 1);
    }

    #[test]
    fn expire_substep_failure_reruns_whole_closure_idempotently() {
        // SET succeeds, EXPIRE fails; the retried closure re-runs both
        let h = harness(&[PRIMARY, SECONDARY], vec![None, conn_err()]);

        h.manager.write("k", "v", Some(30)).unwrap();

        let store = h.store.lock();
        assert_eq!(store.data.get("k"), Some(&("v".to_string(), Some(30))));
        assert_eq!(store.set_calls, 2);
        assert_eq!(store.expire_calls, 1);
    }

    #[test]
    fn first_failure_on_primary_switches_eagerly_without_sleep() {
        let h = harness(&[PRIMARY, SECONDARY], vec![conn_err()]);

        assert_eq!(h.manager.read("missing").unwrap(), None);
        assert_eq!(h.manager.active_key(), ActiveKey::Secondary);
        assert!(h.sleeps.lock().is_empty());
        assert_eq!(
            h.store.lock().connects.as_slice(),
            &[PRIMARY.to_string(), SECONDARY.to_string()]
        );
    }

    #[test]
    fn selector_flips_at_most_once_per_call() {
        let result = harness(&[PRIMARY, SECONDARY], vec![conn_err(), conn_err(), conn_err()])
            .manager
            .read("k");
        assert!(matches!(
            result,
            Err(ManagerError::RetriesExhausted { .. })
        ));

        let h = harness(&[PRIMARY, SECONDARY], vec![conn_err(), conn_err(), conn_err()]);
        let _ = h.manager.read("k");
        assert_eq!(flip_count(&h.events), 1);
        assert_eq!(h.manager.active_key(), ActiveKey::Secondary);
    }

    #[test]
    fn routing_failure_propagates_without_retry_or_reconnect() {
        let h = harness(
            &[PRIMARY, SECONDARY],
            vec![Some(StoreError::Routing(
                "CROSSSLOT Keys in request don't hash to the same slot".to_string(),
            ))],
        );

        let err = h.manager.read("k").unwrap_err();
        assert!(matches!(
            err,
            ManagerError::Store(StoreError::Routing(_))
        ));
        // Only the construction-time connect happened; no flip, no reconnect
        assert_eq!(h.store.lock().connects.len(), 1);
        assert_eq!(flip_count(&h.events), 0);
        assert_eq!(h.manager.active_key(), ActiveKey::Primary);
    }

    #[test]
    fn exhaustion_after_exactly_max_attempts() {
        let h = harness(&[PRIMARY, SECONDARY], vec![conn_err(), conn_err(), conn_err()]);

        let err = h.manager.read("k").unwrap_err();
        match err {
            ManagerError::RetriesExhausted {
                attempts,
                backoff,
                source,
            } => {
                assert_eq!(attempts, 3);
                assert!(matches!(source, StoreError::Connection(_)));
                // Attempt 0 switched eagerly with no sleep; only the sleep
                // before the final attempt contributes
                assert!(backoff >= BASE * 2);
            }
            other => panic!("expected RetriesExhausted, got {:?}", other),
        }
        assert_eq!(h.sleeps.lock().as_slice(), &[BASE * 2]);
        // op_script drained: all three attempts ran
        assert!(h.store.lock().op_script.is_empty());
    }

    #[test]
    fn timeouts_retry_without_switching_or_reconnecting() {
        let h = harness(&[PRIMARY, SECONDARY], vec![timeout_err(), timeout_err()]);

        assert_eq!(h.manager.read("k").unwrap(), None);
        assert_eq!(h.manager.active_key(), ActiveKey::Primary);
        // Only the construction-time connect; timeout retries keep the handle
        assert_eq!(h.store.lock().connects.len(), 1);
        assert_eq!(h.sleeps.lock().as_slice(), &[BASE, BASE * 2]);
    }

    #[test]
    fn initial_connect_falls_back_to_secondary() {
        let h = harness(&[SECONDARY], vec![]);
        assert_eq!(h.manager.active_key(), ActiveKey::Secondary);
        assert!(h.manager.is_connected());
        assert_eq!(
            h.store.lock().connects.as_slice(),
            &[PRIMARY.to_string(), SECONDARY.to_string()]
        );
    }

    #[test]
    fn dual_rejection_at_construction_is_fatal() {
        let err = try_harness(&[], vec![]).err().expect("construction must fail");
        match err {
            ManagerError::Initialization { primary, secondary } => {
                assert!(matches!(primary, StoreError::Auth(_)));
                assert!(matches!(secondary, StoreError::Auth(_)));
            }
            other => panic!("expected Initialization, got {:?}", other),
        }
    }

    #[test]
    fn data_op_reconnects_implicitly_after_close() {
        let h = harness(&[PRIMARY, SECONDARY], vec![]);

        h.manager.close();
        assert!(!h.manager.is_connected());

        assert_eq!(h.manager.read("k").unwrap(), None);
        assert!(h.manager.is_connected());
        assert_eq!(h.store.lock().connects.len(), 2);
    }

    #[test]
    fn reinstatement_probe_failure_keeps_secondary_active() {
        // Primary rejected at startup, so the manager runs on secondary
        let h = harness(&[SECONDARY], vec![]);
        let connects_before = h.store.lock().connects.len();

        h.manager
            .update_primary_credential(Credential::new("still-bad"));

        assert_eq!(h.manager.active_key(), ActiveKey::Secondary);
        assert!(h.manager.is_connected());
        // Exactly one extra connect: the failed probe. The live handle was
        // never rebuilt.
        let store = h.store.lock();
        assert_eq!(store.connects.len(), connects_before + 1);
        assert_eq!(store.connects.last().map(String::as_str), Some("still-bad"));
        assert!(h
            .events
            .0
            .lock()
            .iter()
            .any(|e| matches!(e, FailoverEvent::ReinstatementFailed { .. })));
    }

    #[test]
    fn reinstatement_success_rebuilds_session_on_new_primary() {
        let h = harness(&[SECONDARY], vec![]);
        h.store.lock().good_secrets.insert("rotated-key".to_string());

        h.manager
            .update_primary_credential(Credential::new("rotated-key"));

        assert_eq!(h.manager.active_key(), ActiveKey::Primary);
        assert!(h.manager.is_connected());
        // Probe connect plus live rebuild, both with the new credential
        let store = h.store.lock();
        let tail: Vec<&str> = store
            .connects
            .iter()
            .rev()
            .take(2)
            .map(String::as_str)
            .collect();
        assert_eq!(tail, ["rotated-key", "rotated-key"]);
        assert!(h
            .events
            .0
            .lock()
            .iter()
            .any(|e| matches!(e, FailoverEvent::ReinstatementSucceeded)));
    }

    #[test]
    fn update_while_on_primary_skips_probe() {
        let h = harness(&[PRIMARY, SECONDARY], vec![]);
        let connects_before = h.store.lock().connects.len();

        h.manager
            .update_primary_credential(Credential::new("rotated-key"));

        assert_eq!(h.manager.active_key(), ActiveKey::Primary);
        assert_eq!(h.store.lock().connects.len(), connects_before);
    }

    #[test]
    fn auth_failure_mid_operation_fails_over_to_secondary() {
        // Rotation happened out from under us: primary ops start raising
        // NOAUTH; the very next attempt must run on the secondary
        let h = harness(
            &[PRIMARY, SECONDARY],
            vec![Some(StoreError::Auth("NOAUTH Authentication required.".to_string()))],
        );

        h.manager.write("k", "v", None).unwrap();

        assert_eq!(h.manager.active_key(), ActiveKey::Secondary);
        assert_eq!(
            h.store.lock().data.get("k"),
            Some(&("v".to_string(), None))
        );
        assert!(h.sleeps.lock().is_empty());
    }
}
