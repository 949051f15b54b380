use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use log::*;
use tokio::time::Instant;

use crate::db_types::Order;

/// How long to back off when the accrual service rate limits us without saying for how long.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(5);

/// Decides which pending orders may be queried, and when.
///
/// The poll deadline is the only state shared between concurrent workers. It is stored as milliseconds since the
/// scheduler was created and only ever moves forward, so a late, shorter back-off can never cut an earlier, longer
/// one short.
#[derive(Debug)]
pub struct PollScheduler {
    epoch: Instant,
    resume_at_ms: AtomicU64,
    fallback_delay: Duration,
}

impl Default for PollScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl PollScheduler {
    pub fn new() -> Self {
        Self::with_fallback_delay(DEFAULT_RETRY_AFTER)
    }

    pub fn with_fallback_delay(fallback_delay: Duration) -> Self {
        Self { epoch: Instant::now(), resume_at_ms: AtomicU64::new(0), fallback_delay }
    }

    fn millis_since_epoch(&self, t: Instant) -> u64 {
        let ms = t.saturating_duration_since(self.epoch).as_millis();
        u64::try_from(ms).unwrap_or(u64::MAX)
    }

    /// The instant before which no queries may be issued. In the past if the scheduler is not suspended.
    pub fn resume_at(&self) -> Instant {
        self.epoch + Duration::from_millis(self.resume_at_ms.load(Ordering::Acquire))
    }

    pub fn is_suspended_at(&self, now: Instant) -> bool {
        self.millis_since_epoch(now) < self.resume_at_ms.load(Ordering::Acquire)
    }

    /// Must be checked before every individual query to the accrual service.
    pub fn may_query(&self) -> bool {
        !self.is_suspended_at(Instant::now())
    }

    /// Pushes the poll deadline out to `now + retry_after`, or `now + fallback` if no delay was given. If the deadline is
    /// already later than that, it is left alone.
    ///
    /// Returns the deadline in force after the call.
    pub fn suspend_at(&self, now: Instant, retry_after: Option<Duration>) -> Instant {
        let delay = retry_after.unwrap_or(self.fallback_delay);
        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        // Round up, so the wait is never shorter than requested
        let from_ms = self.millis_since_epoch(now).saturating_add(1);
        let target = from_ms.saturating_add(delay_ms);
        let previous = self.resume_at_ms.fetch_max(target, Ordering::AcqRel);
        if previous < target {
            info!("⏳️ Accrual service asked us to back off. Pausing queries for {}ms", delay_ms);
        } else {
            debug!("⏳️ Back-off requested, but queries are already paused for longer");
        }
        self.epoch + Duration::from_millis(previous.max(target))
    }

    pub fn suspend(&self, retry_after: Option<Duration>) -> Instant {
        self.suspend_at(Instant::now(), retry_after)
    }

    pub fn time_until_resume_at(&self, now: Instant) -> Duration {
        self.resume_at().saturating_duration_since(now)
    }

    /// How long until queries may be issued again. Zero if the scheduler is not suspended.
    pub fn time_until_resume(&self) -> Duration {
        self.time_until_resume_at(Instant::now())
    }

    /// Selects the orders to query in this pass, oldest upload first. While suspended, the batch is empty.
    pub fn next_batch_at(&self, now: Instant, pending: Vec<Order>) -> Vec<Order> {
        if self.is_suspended_at(now) {
            trace!("⏳️ Queries are paused. Skipping {} pending orders", pending.len());
            return Vec::new();
        }
        let mut batch = pending.into_iter().filter(Order::is_pending).collect::<Vec<_>>();
        batch.sort_by(|a, b| a.uploaded_at.cmp(&b.uploaded_at).then(a.id.cmp(&b.id)));
        batch
    }

    pub fn next_batch(&self, pending: Vec<Order>) -> Vec<Order> {
        self.next_batch_at(Instant::now(), pending)
    }
}
