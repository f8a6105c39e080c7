#![allow(dead_code)]

use async_trait::async_trait;
use pixtrack::domain::buyer::{BuyerIdentity, Delivery};
use pixtrack::domain::intent::{BackendIntent, CreateIntentRequest, IntentId};
use pixtrack::domain::ports::PaymentBackend;
use pixtrack::error::{PaymentError, Result};
use pixtrack::infrastructure::simulated::SimulatedPaymentBackend;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub fn buyer(name: &str, tax_id: &str) -> BuyerIdentity {
    BuyerIdentity {
        name: name.to_string(),
        email: "cliente@example.com".to_string(),
        tax_id: tax_id.to_string(),
        delivery: Delivery::Address("Rua das Flores, 100".to_string()),
    }
}

/// Counts a callback's invocations.
pub fn counter() -> (Arc<AtomicUsize>, impl FnOnce() + Send + 'static) {
    let fired = Arc::new(AtomicUsize::new(0));
    let inner = fired.clone();
    (fired, move || {
        inner.fetch_add(1, Ordering::SeqCst);
    })
}

/// Simulated backend that records what the tracker sends it and can be told
/// to fail a number of creations or status queries first.
#[derive(Default)]
pub struct RecordingBackend {
    inner: SimulatedPaymentBackend,
    pub requests: Mutex<Vec<CreateIntentRequest>>,
    pub queries: AtomicUsize,
    pub released: Mutex<Vec<IntentId>>,
    failing_creations: AtomicUsize,
    failing_queries: AtomicUsize,
}

impl RecordingBackend {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_first(creations: usize, queries: usize) -> Arc<Self> {
        let backend = Self::default();
        backend.failing_creations.store(creations, Ordering::SeqCst);
        backend.failing_queries.store(queries, Ordering::SeqCst);
        Arc::new(backend)
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<CreateIntentRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

fn take_failure(counter: &AtomicUsize) -> bool {
    counter
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

#[async_trait]
impl PaymentBackend for RecordingBackend {
    async fn create_intent(&self, request: &CreateIntentRequest) -> Result<BackendIntent> {
        self.requests.lock().unwrap().push(request.clone());
        if take_failure(&self.failing_creations) {
            return Err(PaymentError::IoError(std::io::Error::other(
                "payment server unreachable",
            )));
        }
        self.inner.create_intent(request).await
    }

    async fn query_status(&self, id: IntentId) -> Result<String> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if take_failure(&self.failing_queries) {
            return Err(PaymentError::TransientStatusQueryFailure(
                "connection reset".to_string(),
            ));
        }
        self.inner.query_status(id).await
    }

    async fn release(&self, id: IntentId) {
        self.released.lock().unwrap().push(id);
        self.inner.release(id).await;
    }
}
