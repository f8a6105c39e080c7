use crate::domain::intent::{BackendIntent, CreateIntentRequest, IntentId, PresentablePayload};
use crate::domain::ports::PaymentBackend;
use crate::error::Result;
use async_trait::async_trait;
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

/// Static PNG from the Mercado Pago docs, shown as the QR image for simulated intents.
pub const DEMO_QR_BASE64: &str = "iVBORw0KGgoAAAANSUhEUgAAAJQAAACUCAYAAAB1PADUAAAAAXNSR0IArs4c6QAAACBjSFJNAAB6JgAAgIQAAPoAAACA6AAAdTAAAOpgAAA6mAAAF3CculE8AAAEl0lEQVR4Xu2d0XLEIAxD2///6O5cp50WElAl2cl96Mx4ZCE5lg35+fk5/Hh9/n4D/15fX4/38/n8+P79+4/w6/v+Ry9/r7/d7/f4fD6P1+v1eD+fz+P7+/sI6/f9j17+Xn+73+/x+Xw++/1++P79/Y/w6/v+Ry9/r7/d7/f4fD6f/X4/fP/+/kf49X3/o5e/19/u93t8Pp/Pfr8fvn///iP8+r7/0cvf62/3+z0+n89nv98P379//yP8+r7/0cvf62/3+z0+n89nv98P379//yP8+r7/0cvf62/3+z0+n89nv98P379//yP8+r7/0cvf62/3+z0+n89nv98P379//yP8+r7/0cvf62/3+z0+n89nv98P379//yP8+r7/0cvf62/3+z0+n8/nv/r9/r+Uf/78+fH19fUR1u/7H738vf52v9/j8/l89vv98P37+x/h1/f9j17+Xn+73+/x+Xw++/1++P79/Y/w6/v+Ry9/r7/d7/f4fD6f/X4/fP/+/kf49X3/o5e/19/u93t8Pp/Pfr8fvn///iP8+r7/0cvf62/3+z0+n89nv98P379//yP8+r7/0cvf62/3+z0+n89nv98P379//yP8+r7/0cvf62/3+z0+n89nv98P379//yP8+r7/0cvf62/3+z0+n89nv98P379//yP8+r7/0cvf62/3+z0+n8/nZ/r9/r/I/f/9/T3C+n3/o5e/19/u93t8Pp/Pfr8fvn///iP8+r7/0cvf62/3+z0+n89nv98P379//yP8+r7/0cvf62/3+z0+n89nv98P379//yP8+r7/0cvf62/3+z0+n89nv98P379//yP8+r7/0cvf62/3+z0+n8/nZ/r9fr/H5/P5/Ae///wD/wX/s/yL444AAAAASUVORK5CYII=";

/// Merchant data rendered into the PIX copy-paste code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MerchantProfile {
    pub pix_key: String,
    pub name: String,
    pub receipt_url: String,
}

impl Default for MerchantProfile {
    fn default() -> Self {
        Self {
            pix_key: "pudim@pudimperfeito.com".to_string(),
            name: "Pudim Perfeito".to_string(),
            receipt_url: "https://www.mercadopago.com.br".to_string(),
        }
    }
}

impl MerchantProfile {
    /// Builds the copy-paste code for a charge. Only the template's stability
    /// matters here; the trailing CRC is not recomputed.
    pub fn pix_code(&self, amount: &str, payer_name: &str) -> String {
        let payer: String = payer_name.chars().take(20).collect();
        format!(
            "00020126600014br.gov.bcb.pix0117{}0217{}5204000053039865405{}5802BR5913{}6008Brasilia62070503***6304E2CA",
            self.pix_key, self.name, amount, payer
        )
    }
}

/// Timing model of the simulated backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimulationConfig {
    /// Artificial latency of intent creation.
    pub creation_delay: Duration,
    /// Intents report `approved` once strictly older than this.
    pub approval_after: Duration,
    /// Registry entries older than this are evicted on the next creation.
    pub retention: Duration,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            creation_delay: Duration::from_millis(1500),
            approval_after: Duration::from_secs(5),
            retention: Duration::from_secs(600),
        }
    }
}

/// Stand-in backend that approves every intent a fixed time after creation.
///
/// Creation timestamps live in a registry owned by this instance; clones share it.
#[derive(Default, Clone)]
pub struct SimulatedPaymentBackend {
    config: SimulationConfig,
    merchant: MerchantProfile,
    created: Arc<RwLock<HashMap<IntentId, Instant>>>,
}

impl SimulatedPaymentBackend {
    pub fn new(config: SimulationConfig, merchant: MerchantProfile) -> Self {
        Self {
            config,
            merchant,
            created: Arc::default(),
        }
    }

    /// Number of intents currently remembered.
    pub async fn tracked(&self) -> usize {
        self.created.read().await.len()
    }
}

#[async_trait]
impl PaymentBackend for SimulatedPaymentBackend {
    async fn create_intent(&self, request: &CreateIntentRequest) -> Result<BackendIntent> {
        tokio::time::sleep(self.config.creation_delay).await;

        let id = {
            let mut created = self.created.write().await;
            let now = Instant::now();
            let retention = self.config.retention;
            created.retain(|_, at| now.duration_since(*at) < retention);

            let mut rng = rand::thread_rng();
            let id = loop {
                let candidate = IntentId(rng.gen_range(0..1_000_000_000));
                if !created.contains_key(&candidate) {
                    break candidate;
                }
            };
            created.insert(id, now);
            id
        };
        debug!(%id, "simulated intent created");

        let code = self
            .merchant
            .pix_code(&request.amount.to_fixed_2(), &request.payer_name);

        Ok(BackendIntent {
            id,
            status: "pending".to_string(),
            payload: PresentablePayload {
                qr_image_base64: DEMO_QR_BASE64.to_string(),
                copy_paste_code: code,
                receipt_url: Some(self.merchant.receipt_url.clone()),
            },
        })
    }

    async fn query_status(&self, id: IntentId) -> Result<String> {
        let created = self.created.read().await;
        let status = match created.get(&id) {
            Some(at) if at.elapsed() > self.config.approval_after => "approved",
            _ => "pending",
        };
        Ok(status.to_string())
    }

    async fn release(&self, id: IntentId) {
        self.created.write().await.remove(&id);
    }
}
