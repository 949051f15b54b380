//! The accrual worker.
//!
//! A single background task that keeps pulling unresolved orders through the accrual service. Each pass lists the
//! pending orders, asks the [`PollScheduler`] which of them may be queried, and queries them oldest first with bounded
//! parallelism. Every response is handed to the [`StatusResolver`]. When the accrual service rate limits us, the poll
//! deadline is published immediately and no further queries are started until it has passed.
use std::{sync::Arc, time::Duration};

use futures::{stream, StreamExt};
use log::*;
use loyalty_engine::{
    db_types::Order,
    AccrualClient,
    AccrualResponse,
    AccrualService,
    OrderStore,
    PollScheduler,
    Resolution,
    SqliteDatabase,
    StatusResolver,
};
use tokio::{sync::watch, task::JoinHandle};

#[derive(Clone, Debug)]
pub struct AccrualWorkerConfig {
    /// The maximum number of accrual queries in flight at once
    pub concurrency: usize,
    /// The pause between passes
    pub idle_interval: Duration,
}

impl Default for AccrualWorkerConfig {
    fn default() -> Self {
        Self { concurrency: 4, idle_interval: Duration::from_secs(1) }
    }
}

/// Counters for a single reconciliation pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassSummary {
    /// Queries actually sent to the accrual service
    pub queried: usize,
    pub credited: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub rejected: usize,
    /// The accrual service was unavailable, or the result could not be stored
    pub failed: usize,
    pub rate_limited: usize,
    /// Orders that were due, but not queried because queries were paused or the worker is shutting down
    pub skipped: usize,
}

impl PassSummary {
    fn record(&mut self, outcome: OrderOutcome) {
        if !matches!(outcome, OrderOutcome::Skipped) {
            self.queried += 1;
        }
        match outcome {
            OrderOutcome::Skipped => self.skipped += 1,
            OrderOutcome::RateLimited => self.rate_limited += 1,
            OrderOutcome::Failed => self.failed += 1,
            OrderOutcome::Resolved(Resolution::Credited { .. }) => self.credited += 1,
            OrderOutcome::Resolved(Resolution::Updated { .. }) => self.updated += 1,
            OrderOutcome::Resolved(Resolution::Unchanged) => self.unchanged += 1,
            OrderOutcome::Resolved(Resolution::Rejected { .. }) => self.rejected += 1,
        }
    }
}

#[derive(Debug)]
enum OrderOutcome {
    Skipped,
    RateLimited,
    Failed,
    Resolved(Resolution),
}

pub struct AccrualWorker<S, A> {
    resolver: StatusResolver<S>,
    accrual: A,
    scheduler: Arc<PollScheduler>,
    config: AccrualWorkerConfig,
    shutdown: watch::Receiver<bool>,
}

impl<S, A> AccrualWorker<S, A>
where
    S: OrderStore,
    A: AccrualService,
{
    /// Creates a new worker. Sending `true` on the `shutdown` channel, or dropping its sender, stops the worker after the
    /// current pass.
    pub fn new(store: S, accrual: A, config: AccrualWorkerConfig, shutdown: watch::Receiver<bool>) -> Self {
        let resolver = StatusResolver::new(store);
        Self { resolver, accrual, scheduler: Arc::new(PollScheduler::new()), config, shutdown }
    }

    /// Shares a poll scheduler with other holders, e.g. another worker talking to the same accrual service.
    pub fn with_scheduler(mut self, scheduler: Arc<PollScheduler>) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn scheduler(&self) -> &PollScheduler {
        &self.scheduler
    }

    fn is_shutting_down(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Runs a single reconciliation pass over every pending order.
    ///
    /// A rate limit only stops queries that have not started yet. With `concurrency > 1`, queries already in flight when
    /// the 429 arrives still complete and are applied as usual.
    pub async fn run_pass(&self) -> PassSummary {
        let mut summary = PassSummary::default();
        let pending = match self.resolver.store().list_pending().await {
            Ok(pending) => pending,
            Err(e) => {
                error!("🔄️ Could not fetch pending orders. Will try again on the next pass. {e}");
                return summary;
            },
        };
        let batch = self.scheduler.next_batch(pending);
        if batch.is_empty() {
            trace!("🔄️ Nothing to reconcile");
            return summary;
        }
        debug!("🔄️ Reconciling {} orders", batch.len());
        let concurrency = self.config.concurrency.max(1);
        let outcomes = stream::iter(batch.iter())
            .map(|order| self.process_order(order))
            .buffer_unordered(concurrency)
            .collect::<Vec<_>>()
            .await;
        outcomes.into_iter().for_each(|o| summary.record(o));
        summary
    }

    async fn process_order(&self, order: &Order) -> OrderOutcome {
        if self.is_shutting_down() || !self.scheduler.may_query() {
            return OrderOutcome::Skipped;
        }
        let response = self.accrual.query(&order.number).await;
        match &response {
            AccrualResponse::RateLimited { retry_after } => {
                let resume_at = self.scheduler.suspend(retry_after.map(Duration::from_secs));
                debug!(
                    "🔄️ Rate limited while querying order {}. Resuming in {:?}",
                    order.number,
                    resume_at.saturating_duration_since(tokio::time::Instant::now())
                );
                return OrderOutcome::RateLimited;
            },
            AccrualResponse::Unavailable(reason) => {
                warn!("🔄️ Could not get the accrual status for order {}. {reason}", order.number);
                return OrderOutcome::Failed;
            },
            _ => {},
        }
        match self.resolver.apply(order, &response).await {
            Ok(resolution) => OrderOutcome::Resolved(resolution),
            Err(e) => {
                error!("🔄️ Could not store the accrual result for order {}. It will be retried. {e}", order.number);
                OrderOutcome::Failed
            },
        }
    }

    /// Runs passes until shutdown is requested. A pass that has started always runs to completion.
    pub async fn run(mut self) {
        info!("🔄️ Accrual worker started");
        loop {
            if self.is_shutting_down() {
                break;
            }
            let summary = self.run_pass().await;
            if summary != PassSummary::default() {
                debug!("🔄️ Pass complete. {summary:?}");
            }
            let wait = self.config.idle_interval.max(self.scheduler.time_until_resume());
            tokio::select! {
                _ = tokio::time::sleep(wait) => {},
                changed = self.shutdown.changed() => {
                    if changed.is_err() {
                        info!("🔄️ Shutdown channel closed");
                        break;
                    }
                },
            }
        }
        info!("🔄️ Accrual worker stopped");
    }
}

/// Starts the accrual worker on the current actix runtime. The returned handle completes once shutdown has been
/// signalled on `shutdown` and the current pass has finished.
pub fn start_accrual_worker(
    db: SqliteDatabase,
    client: AccrualClient,
    config: AccrualWorkerConfig,
    shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    let worker = AccrualWorker::new(db, client, config, shutdown);
    actix_web::rt::spawn(worker.run())
}
