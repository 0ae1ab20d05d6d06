//! Per-client failed PIN attempt tracking and temporary lockout.
//!
//! Records live in memory only and disappear once the lockout window has
//! passed since the client's last failure, either when the client is next
//! checked or when the background sweep runs.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::debug;

/// How often the background sweep prunes expired records.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
struct AttemptRecord {
    failed_count: u32,
    last_attempt: Instant,
}

/// Failed-attempt counter keyed by client identifier.
///
/// Concurrent failures from one client may interleave; the count is only
/// guaranteed not to decrease, which is all the `>= max_attempts` check needs.
pub struct RateLimiter {
    max_attempts: u32,
    lockout: Duration,
    attempts: Mutex<HashMap<String, AttemptRecord>>,
}

impl RateLimiter {
    pub fn new(max_attempts: u32, lockout: Duration) -> Self {
        Self {
            max_attempts,
            lockout,
            attempts: Mutex::new(HashMap::new()),
        }
    }

    fn records(&self) -> MutexGuard<'_, HashMap<String, AttemptRecord>> {
        self.attempts.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_stale(&self, record: &AttemptRecord, now: Instant) -> bool {
        now.saturating_duration_since(record.last_attempt) >= self.lockout
    }

    /// Count a failed attempt for `client`.
    pub fn record_failure(&self, client: &str) {
        self.record_failure_at(client, Instant::now());
    }

    pub fn record_failure_at(&self, client: &str, now: Instant) {
        let mut records = self.records();
        let record = records.entry(client.to_string()).or_insert(AttemptRecord {
            failed_count: 0,
            last_attempt: now,
        });
        if self.is_stale(record, now) {
            record.failed_count = 0;
        }
        record.failed_count = record.failed_count.saturating_add(1);
        record.last_attempt = now;
    }

    /// Whether `client` is currently locked out. Clears an expired record.
    pub fn is_locked_out(&self, client: &str) -> bool {
        self.lockout_remaining(client).is_some()
    }

    pub fn is_locked_out_at(&self, client: &str, now: Instant) -> bool {
        self.lockout_remaining_at(client, now).is_some()
    }

    /// Time left until `client` may try again, or `None` if not locked out.
    pub fn lockout_remaining(&self, client: &str) -> Option<Duration> {
        self.lockout_remaining_at(client, Instant::now())
    }

    pub fn lockout_remaining_at(&self, client: &str, now: Instant) -> Option<Duration> {
        let mut records = self.records();
        let record = *records.get(client)?;

        if self.is_stale(&record, now) {
            records.remove(client);
            debug!("Lockout record for {} expired", client);
            return None;
        }

        if record.failed_count >= self.max_attempts {
            let elapsed = now.saturating_duration_since(record.last_attempt);
            Some(self.lockout.saturating_sub(elapsed))
        } else {
            None
        }
    }

    /// Failures `client` can still make before being locked out.
    pub fn attempts_remaining(&self, client: &str) -> u32 {
        let records = self.records();
        let used = records.get(client).map_or(0, |r| r.failed_count);
        self.max_attempts.saturating_sub(used)
    }

    /// Forget all failures for `client`.
    pub fn reset(&self, client: &str) {
        self.records().remove(client);
    }

    /// Drop every record whose lockout window has passed. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        self.sweep_at(Instant::now())
    }

    pub fn sweep_at(&self, now: Instant) -> usize {
        let mut records = self.records();
        let before = records.len();
        records.retain(|_, record| !self.is_stale(record, now));
        before - records.len()
    }

    /// Number of clients with a live record.
    pub fn tracked_clients(&self) -> usize {
        self.records().len()
    }

    /// Run [`RateLimiter::sweep`] every `period` on the tokio runtime.
    ///
    /// The task stops on its own once the limiter is dropped.
    pub fn spawn_sweeper(self: &Arc<Self>, period: Duration) -> JoinHandle<()> {
        let limiter = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick completes immediately
            interval.tick().await;

            loop {
                interval.tick().await;
                let Some(limiter) = limiter.upgrade() else {
                    break;
                };
                let removed = limiter.sweep();
                if removed > 0 {
                    debug!("Swept {} expired lockout record(s)", removed);
                }
            }
        })
    }
}
