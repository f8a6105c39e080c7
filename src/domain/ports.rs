use super::intent::{BackendIntent, CreateIntentRequest, IntentId};
use crate::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Remote (or simulated) service that creates PIX intents and reports their status.
///
/// Implementations must be interchangeable: the tracker never knows which one
/// it talks to.
#[async_trait]
pub trait PaymentBackend: Send + Sync {
    async fn create_intent(&self, request: &CreateIntentRequest) -> Result<BackendIntent>;

    /// Point-in-time status string. Unknown or expired ids answer a
    /// non-terminal status instead of an error.
    async fn query_status(&self, id: IntentId) -> Result<String>;

    /// Called once the tracker loses interest in an intent.
    async fn release(&self, _id: IntentId) {}
}

pub type PaymentBackendRef = Arc<dyn PaymentBackend>;
