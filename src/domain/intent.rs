use super::amount::Amount;
use super::buyer::Buyer;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier assigned to an intent by the payment backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IntentId(pub u64);

impl fmt::Display for IntentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Status of an intent as surfaced to the checkout.
///
/// Backends may report richer sub-statuses; they all collapse into these two.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IntentStatus {
    #[default]
    Pending,
    Approved,
}

impl IntentStatus {
    pub const APPROVED: &'static str = "approved";

    /// Maps a raw backend status string. Only the exact literal `approved` is
    /// terminal; anything else, including unknown values, stays pending.
    pub fn from_backend(raw: &str) -> Self {
        if raw == Self::APPROVED {
            IntentStatus::Approved
        } else {
            IntentStatus::Pending
        }
    }

    pub fn is_terminal(&self) -> bool {
        *self == IntentStatus::Approved
    }
}

/// What the payer is shown: QR image, copy-paste code and an optional receipt link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentablePayload {
    /// PNG image, base64 encoded.
    pub qr_image_base64: String,
    /// "Pix copia e cola" code.
    pub copy_paste_code: String,
    pub receipt_url: Option<String>,
}

/// Intent-creation request handed to a [`PaymentBackend`](super::ports::PaymentBackend).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateIntentRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    #[serde(rename = "cpf")]
    pub tax_id: String,
    #[serde(rename = "address")]
    pub delivery_address: String,
    pub amount: Amount,
    /// Untruncated buyer name, used by backends that render it into the PIX code.
    #[serde(skip)]
    pub payer_name: String,
}

impl CreateIntentRequest {
    pub fn new(amount: Amount, buyer: &Buyer) -> Self {
        Self {
            first_name: buyer.first_name.clone(),
            last_name: buyer.last_name.clone(),
            email: buyer.email.clone(),
            tax_id: buyer.tax_id.clone(),
            delivery_address: buyer.delivery.address_line().to_string(),
            amount,
            payer_name: buyer.full_name.clone(),
        }
    }
}

/// Intent as answered by a backend on creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendIntent {
    pub id: IntentId,
    pub status: String,
    pub payload: PresentablePayload,
}

/// A single payment attempt, owned by the tracker.
///
/// `amount` and `buyer` are captured at creation and never re-read.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentIntent {
    pub id: IntentId,
    pub amount: Amount,
    pub buyer: Buyer,
    pub payload: PresentablePayload,
    pub status: IntentStatus,
}
