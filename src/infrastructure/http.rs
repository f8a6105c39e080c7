use crate::domain::intent::{BackendIntent, CreateIntentRequest, IntentId, PresentablePayload};
use crate::domain::ports::PaymentBackend;
use crate::error::{PaymentError, Result};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpBackendConfig {
    /// Collection URL of the PIX resource, e.g. `http://localhost:8080/api/pix`.
    pub base_url: String,
    pub timeout: Duration,
}

impl HttpBackendConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Payment creation response, in the shape Mercado Pago answers.
#[derive(Debug, Deserialize)]
struct PixResponse {
    id: IntentId,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    status_detail: Option<String>,
    point_of_interaction: PointOfInteraction,
}

#[derive(Debug, Deserialize)]
struct PointOfInteraction {
    transaction_data: TransactionData,
}

#[derive(Debug, Deserialize)]
struct TransactionData {
    qr_code_base64: String,
    qr_code: String,
    #[serde(default)]
    ticket_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    status: Option<String>,
}

impl From<PixResponse> for BackendIntent {
    fn from(response: PixResponse) -> Self {
        let data = response.point_of_interaction.transaction_data;
        Self {
            id: response.id,
            status: response.status.unwrap_or_else(|| "pending".to_string()),
            payload: PresentablePayload {
                qr_image_base64: data.qr_code_base64,
                copy_paste_code: data.qr_code,
                receipt_url: data.ticket_url,
            },
        }
    }
}

/// Talks to the shop's payment server over JSON/HTTP.
#[derive(Clone)]
pub struct HttpPaymentBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpPaymentBackend {
    pub fn new(config: HttpBackendConfig) -> Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn status_url(&self, id: IntentId) -> String {
        format!("{}/{}", self.base_url, id)
    }
}

#[async_trait]
impl PaymentBackend for HttpPaymentBackend {
    async fn create_intent(&self, request: &CreateIntentRequest) -> Result<BackendIntent> {
        let response = self
            .client
            .post(&self.base_url)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                error!("Error reaching payment server: {}", e);
                PaymentError::PaymentCreationFailed(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("Payment server rejected intent creation: {}", status);
            return Err(PaymentError::PaymentCreationFailed(format!(
                "payment server answered {}",
                status
            )));
        }

        let body: PixResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::PaymentCreationFailed(e.to_string()))?;
        debug!(id = %body.id, detail = ?body.status_detail, "intent created");

        Ok(body.into())
    }

    async fn query_status(&self, id: IntentId) -> Result<String> {
        let response = self
            .client
            .get(self.status_url(id))
            .send()
            .await
            .map_err(|e| PaymentError::TransientStatusQueryFailure(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok("pending".to_string());
        }
        if !status.is_success() {
            return Err(PaymentError::TransientStatusQueryFailure(format!(
                "payment server answered {}",
                status
            )));
        }

        let body: StatusResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::TransientStatusQueryFailure(e.to_string()))?;
        Ok(body.status.unwrap_or_else(|| "pending".to_string()))
    }
}
