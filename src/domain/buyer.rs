use crate::error::PaymentError;

/// Last name sent when the buyer typed a single-word name; the payment
/// provider rejects an empty last name.
pub const DEFAULT_LAST_NAME: &str = "Cliente";

/// Address marker sent for in-store pickup orders.
pub const PICKUP_ADDRESS: &str = "Retirada no Local";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Address(String),
    Pickup,
}

impl Delivery {
    /// The address line forwarded to the payment backend.
    pub fn address_line(&self) -> &str {
        match self {
            Delivery::Address(address) => address,
            Delivery::Pickup => PICKUP_ADDRESS,
        }
    }

    pub fn is_delivery(&self) -> bool {
        matches!(self, Delivery::Address(_))
    }
}

/// Buyer data as typed into the checkout form, before any normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuyerIdentity {
    pub name: String,
    pub email: String,
    pub tax_id: String,
    pub delivery: Delivery,
}

/// Immutable, normalized snapshot of the buyer taken when an intent is created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buyer {
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// CPF with every non-digit stripped.
    pub tax_id: String,
    pub delivery: Delivery,
}

/// Strips punctuation and spaces from a CPF, e.g. `123.456.789-00` -> `12345678900`.
pub fn normalize_tax_id(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Splits a full name into its first token and the remaining tokens.
pub fn split_name(full_name: &str) -> (String, String) {
    let mut tokens = full_name.split_whitespace();
    let first = tokens.next().unwrap_or_default().to_string();
    let rest = tokens.collect::<Vec<_>>().join(" ");
    let last = if rest.is_empty() {
        DEFAULT_LAST_NAME.to_string()
    } else {
        rest
    };
    (first, last)
}

impl TryFrom<&BuyerIdentity> for Buyer {
    type Error = PaymentError;

    fn try_from(identity: &BuyerIdentity) -> Result<Self, Self::Error> {
        let full_name = identity.name.trim();
        if full_name.is_empty() {
            return Err(PaymentError::ValidationError("Name is required".to_string()));
        }

        let email = identity.email.trim();
        if email.is_empty() {
            return Err(PaymentError::ValidationError("Email is required".to_string()));
        }

        let tax_id = normalize_tax_id(&identity.tax_id);
        if tax_id.is_empty() {
            return Err(PaymentError::ValidationError("CPF is required".to_string()));
        }

        if let Delivery::Address(address) = &identity.delivery
            && address.trim().is_empty()
        {
            return Err(PaymentError::ValidationError(
                "Delivery address is required".to_string(),
            ));
        }

        let (first_name, last_name) = split_name(full_name);

        Ok(Self {
            full_name: full_name.to_string(),
            first_name,
            last_name,
            email: email.to_string(),
            tax_id,
            delivery: identity.delivery.clone(),
        })
    }
}
