use crate::domain::intent::{IntentId, IntentStatus};
use crate::domain::ports::PaymentBackendRef;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Timing of the status-polling loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackerConfig {
    /// Cadence of status ticks. The first tick fires one interval after polling starts.
    pub poll_interval: Duration,
    /// Delay between observing approval and invoking the success callback.
    pub grace_delay: Duration,
    /// Upper bound for a single status query; a timed-out query counts as a failed tick.
    /// Ticks that fall due while a query is outstanding are skipped, so this may
    /// exceed `poll_interval`.
    pub query_timeout: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(2),
            grace_delay: Duration::from_secs(3),
            query_timeout: Duration::from_secs(10),
        }
    }
}

/// How a polling loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Approval was observed and the success callback ran.
    Reported,
    /// Interest was withdrawn before the callback ran.
    Cancelled,
}

/// Handle on a running polling loop for one intent.
///
/// Dropping the handle withdraws interest, same as [`PollHandle::cancel`] but
/// without waiting for the task to wind down.
pub struct PollHandle {
    id: IntentId,
    status: watch::Receiver<IntentStatus>,
    done: watch::Receiver<Option<PollOutcome>>,
    cancel: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl PollHandle {
    /// Spawns the polling loop on the current tokio runtime.
    pub fn spawn<F>(
        backend: PaymentBackendRef,
        id: IntentId,
        config: TrackerConfig,
        on_success: F,
    ) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let (status_tx, status_rx) = watch::channel(IntentStatus::Pending);
        let (done_tx, done_rx) = watch::channel(None);
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let task = tokio::spawn(async move {
            let outcome = run(backend, id, config, status_tx, cancel_rx, on_success).await;
            done_tx.send_replace(Some(outcome));
        });

        Self {
            id,
            status: status_rx,
            done: done_rx,
            cancel: cancel_tx,
            task: Some(task),
        }
    }

    pub fn id(&self) -> IntentId {
        self.id
    }

    /// Latest status observed by the loop.
    pub fn status(&self) -> IntentStatus {
        *self.status.borrow()
    }

    /// Stops the loop and waits until it has exited. Once this returns no tick,
    /// backend call or callback happens for the intent. Calling it again is a no-op.
    pub async fn cancel(&mut self) -> PollOutcome {
        let _ = self.cancel.send(true);
        if let Some(task) = self.task.take() {
            // Only a panicking callback makes the join fail; that counts as cancelled.
            let _ = task.await;
        }
        self.done.borrow().unwrap_or(PollOutcome::Cancelled)
    }

    /// Future resolving once the loop has ended, on its own or through cancellation.
    ///
    /// The future does not borrow the handle, so it can be awaited while the
    /// handle stays reachable for [`PollHandle::cancel`].
    pub fn outcome(&self) -> impl Future<Output = PollOutcome> + Send + 'static {
        let mut done = self.done.clone();
        async move {
            match done.wait_for(Option::is_some).await {
                Ok(outcome) => outcome.unwrap_or(PollOutcome::Cancelled),
                Err(_) => PollOutcome::Cancelled,
            }
        }
    }
}

async fn run<F>(
    backend: PaymentBackendRef,
    id: IntentId,
    config: TrackerConfig,
    status: watch::Sender<IntentStatus>,
    mut cancel: watch::Receiver<bool>,
    on_success: F,
) -> PollOutcome
where
    F: FnOnce() + Send + 'static,
{
    let mut ticker = time::interval_at(Instant::now() + config.poll_interval, config.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel.changed() => {
                debug!(%id, "polling cancelled");
                return PollOutcome::Cancelled;
            }
            _ = ticker.tick() => {}
        }

        let started = Instant::now();
        let observed = tokio::select! {
            biased;
            _ = cancel.changed() => {
                debug!(%id, "polling cancelled during status query");
                return PollOutcome::Cancelled;
            }
            result = time::timeout(config.query_timeout, backend.query_status(id)) => match result {
                Ok(Ok(raw)) => IntentStatus::from_backend(&raw),
                Ok(Err(e)) => {
                    warn!(%id, "status query failed, still pending: {}", e);
                    IntentStatus::Pending
                }
                Err(_) => {
                    warn!(%id, "status query timed out, still pending");
                    IntentStatus::Pending
                }
            },
        };

        if observed.is_terminal() {
            break;
        }
        // Ticks that fell due while the query was outstanding are dropped.
        if started.elapsed() >= config.poll_interval {
            ticker.reset();
        }
        debug!(%id, "payment pending");
    }

    status.send_replace(IntentStatus::Approved);
    info!(%id, "payment approved");

    tokio::select! {
        biased;
        _ = cancel.changed() => return PollOutcome::Cancelled,
        _ = time::sleep(config.grace_delay) => {}
    }
    if *cancel.borrow() {
        return PollOutcome::Cancelled;
    }

    on_success();
    backend.release(id).await;
    PollOutcome::Reported
}
