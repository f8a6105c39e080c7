use super::poller::{PollHandle, PollOutcome, TrackerConfig};
use crate::domain::amount::Amount;
use crate::domain::buyer::{Buyer, BuyerIdentity};
use crate::domain::intent::{CreateIntentRequest, IntentId, IntentStatus, PaymentIntent};
use crate::domain::ports::PaymentBackendRef;
use crate::error::{PaymentError, Result};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;
use tracing::{error, info};

/// The intent currently shown to the payer, plus its polling loop once started.
struct ActiveIntent {
    id: IntentId,
    poll: Option<PollHandle>,
}

/// Owns the lifecycle of one PIX payment at a time.
///
/// The tracker creates intents through a [`PaymentBackend`](crate::domain::ports::PaymentBackend),
/// polls their status on a fixed cadence and reports approval exactly once.
/// Starting a new checkout cancels whatever intent was active before.
pub struct PaymentTracker {
    backend: PaymentBackendRef,
    config: TrackerConfig,
    active: Mutex<Option<ActiveIntent>>,
    creating: AtomicBool,
}

/// Clears the in-flight creation flag when creation ends, however it ends.
struct CreationGuard<'a>(&'a AtomicBool);

impl Drop for CreationGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl PaymentTracker {
    /// Creates a new `PaymentTracker`.
    ///
    /// # Arguments
    ///
    /// * `backend` - The real or simulated payment backend.
    /// * `config` - Polling cadence and grace delay.
    pub fn new(backend: PaymentBackendRef, config: TrackerConfig) -> Self {
        Self {
            backend,
            config,
            active: Mutex::new(None),
            creating: AtomicBool::new(false),
        }
    }

    /// Creates a payment intent for `amount` on behalf of the buyer.
    ///
    /// Input is validated before the backend is contacted. Only one creation may
    /// be in flight at a time; a concurrent call fails with
    /// [`PaymentError::CreationInProgress`]. On success the new intent becomes
    /// the active one and any previous intent is cancelled.
    pub async fn create(&self, amount: Decimal, identity: &BuyerIdentity) -> Result<PaymentIntent> {
        let amount = Amount::new(amount)?;
        let buyer = Buyer::try_from(identity)?;

        if self
            .creating
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            return Err(PaymentError::CreationInProgress);
        }
        let _guard = CreationGuard(&self.creating);

        let request = CreateIntentRequest::new(amount, &buyer);
        let created = self.backend.create_intent(&request).await.map_err(|e| {
            error!("Error creating payment intent: {}", e);
            match e {
                PaymentError::PaymentCreationFailed(_) => e,
                other => PaymentError::PaymentCreationFailed(other.to_string()),
            }
        })?;

        let intent = PaymentIntent {
            id: created.id,
            amount,
            buyer,
            payload: created.payload,
            status: IntentStatus::Pending,
        };
        info!(id = %intent.id, amount = %intent.amount, "payment intent created");

        let previous = self.active.lock().await.replace(ActiveIntent {
            id: intent.id,
            poll: None,
        });
        if let Some(previous) = previous {
            self.discard(previous).await;
        }

        Ok(intent)
    }

    /// Starts polling the active intent; `on_success` runs once, a grace delay
    /// after approval is observed, and the backend then releases the intent.
    /// Polling an intent that is already being polled is a no-op.
    pub async fn poll_status<F>(&self, id: IntentId, on_success: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut active = self.active.lock().await;
        match active.as_mut() {
            Some(current) if current.id == id => {
                if current.poll.is_none() {
                    current.poll = Some(PollHandle::spawn(
                        self.backend.clone(),
                        id,
                        self.config,
                        on_success,
                    ));
                }
                Ok(())
            }
            _ => Err(PaymentError::UnknownIntent(id)),
        }
    }

    /// Latest observed status of the active intent, `None` for any other id.
    pub async fn status(&self, id: IntentId) -> Option<IntentStatus> {
        let active = self.active.lock().await;
        active.as_ref().filter(|a| a.id == id).map(|a| {
            a.poll
                .as_ref()
                .map(PollHandle::status)
                .unwrap_or(IntentStatus::Pending)
        })
    }

    /// Waits until polling of the active intent ends, then forgets the intent.
    ///
    /// Returns `None` when `id` is not the active intent or is not being polled.
    pub async fn wait(&self, id: IntentId) -> Option<PollOutcome> {
        // The lock is released while waiting so `cancel` stays available.
        let finished = {
            let active = self.active.lock().await;
            match active.as_ref() {
                Some(current) if current.id == id => current.poll.as_ref()?.outcome(),
                _ => return None,
            }
        };
        let outcome = finished.await;

        // A reported intent was already released by its polling task, a
        // cancelled one by `discard`.
        let mut active = self.active.lock().await;
        if active.as_ref().is_some_and(|a| a.id == id) {
            *active = None;
        }
        Some(outcome)
    }

    /// Withdraws interest in an intent. Once this returns, no further status
    /// query or callback happens for it. Unknown or finished intents are ignored.
    pub async fn cancel(&self, id: IntentId) {
        let current = {
            let mut active = self.active.lock().await;
            if active.as_ref().is_some_and(|a| a.id == id) {
                active.take()
            } else {
                None
            }
        };
        if let Some(current) = current {
            info!(%id, "payment view closed");
            self.discard(current).await;
        }
    }

    async fn discard(&self, mut intent: ActiveIntent) {
        if let Some(poll) = intent.poll.as_mut() {
            poll.cancel().await;
        }
        self.backend.release(intent.id).await;
    }
}
