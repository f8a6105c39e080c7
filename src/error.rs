use crate::domain::intent::IntentId;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PaymentError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Payment creation failed: {0}")]
    PaymentCreationFailed(String),
    #[error("Status query failed: {0}")]
    TransientStatusQueryFailure(String),
    #[error("A payment is already being created")]
    CreationInProgress,
    #[error("Intent {0} is not the active payment")]
    UnknownIntent(IntentId),
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, PaymentError>;
