//! Continuous write workload
//!
//! Writes keys in a loop through the failover manager, riding through a
//! credential rotation if one happens mid-run. Used to exercise a live
//! deployment during a rotation drill and to report what the application
//! would have observed.

use std::time::{Duration, Instant};

use hdrhistogram::Histogram;
use serde::Serialize;
use tracing::{info, warn};

use crate::client::StoreConnector;
use crate::manager::{ActiveKey, FailoverManager};

/// Parameters for one soak run
#[derive(Debug, Clone)]
pub struct SoakConfig {
    /// Prefix for generated keys (`{prefix}:{id}`)
    pub key_prefix: String,
    pub start_id: u64,
    pub count: u64,
    /// Delay between writes; not applied after the last one
    pub interval: Duration,
    /// Optional TTL applied to every write
    pub ttl: Option<u64>,
}

impl Default for SoakConfig {
    fn default() -> Self {
        Self {
            key_prefix: "soak".to_string(),
            start_id: 0,
            count: 100,
            interval: Duration::from_millis(500),
            ttl: None,
        }
    }
}

/// Outcome of a soak run
#[derive(Debug, Clone, Serialize)]
pub struct SoakStats {
    pub total: u64,
    pub successful: u64,
    pub failed: u64,
    /// Times the active key changed under a write
    pub key_switches: u64,
    /// Key slot in use when the run ended
    pub final_key: String,
    pub p50_latency_us: u64,
    pub p99_latency_us: u64,
    pub max_latency_us: u64,
}

/// Run the continuous write loop.
///
/// `observer` is invoked after every write with `(id, succeeded, active_key)`.
pub fn run_soak<C: StoreConnector>(
    manager: &FailoverManager<C>,
    config: &SoakConfig,
    mut observer: impl FnMut(u64, bool, ActiveKey),
) -> SoakStats {
    let mut histogram =
        Histogram::<u64>::new(3).expect("3 significant figures is within histogram limits");

    let mut successful = 0u64;
    let mut failed = 0u64;
    let mut key_switches = 0u64;

    info!(
        "starting continuous write run: {} keys, interval {:?}",
        config.count, config.interval
    );

    let run_start = Instant::now();
    let end_id = config.start_id + config.count;

    for id in config.start_id..end_id {
        let key = format!("{}:{}", config.key_prefix, id);
        let value = format!("data-{}-{:.3}", id, run_start.elapsed().as_secs_f64());

        let key_before = manager.active_key();
        let write_start = Instant::now();
        let outcome = manager.write(&key, &value, config.ttl);
        let succeeded = outcome.is_ok();

        match outcome {
            Ok(()) => {
                successful += 1;
                histogram
                    .record(write_start.elapsed().as_micros() as u64)
                    .ok();
            }
            Err(err) => {
                failed += 1;
                warn!("write {} failed: {}", id, err);
            }
        }

        let key_after = manager.active_key();
        if key_before != key_after {
            key_switches += 1;
            warn!(
                "key switch detected during write {}: {} -> {}",
                id, key_before, key_after
            );
        }

        observer(id, succeeded, key_after);

        if id + 1 < end_id && !config.interval.is_zero() {
            std::thread::sleep(config.interval);
        }
    }

    let stats = SoakStats {
        total: config.count,
        successful,
        failed,
        key_switches,
        final_key: manager.active_key().to_string(),
        p50_latency_us: histogram.value_at_quantile(0.50),
        p99_latency_us: histogram.value_at_quantile(0.99),
        max_latency_us: histogram.max(),
    };

    info!(
        "continuous write run complete: {}/{} successful, {} key switches, final key {}",
        stats.successful, stats.total, stats.key_switches, stats.final_key
    );

    stats
}
