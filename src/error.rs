//! Error types for balance reconciliation and its surrounding plumbing.

use crate::model::SaleId;
use crate::money::Money;
use thiserror::Error;

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, Error>;

/// Reasons a proposed payment is rejected before submission.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentError {
    /// The proposed amount is zero or negative
    #[error("Invalid amount: payments must be greater than zero")]
    InvalidAmount,

    /// The sale is already fully paid or overpaid
    #[error("Sale {sale_id} has no outstanding balance (outstanding {outstanding})")]
    NoOutstandingBalance { sale_id: SaleId, outstanding: Money },
}

/// Form input rejected by superficial validation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormError {
    #[error("Missing required field '{0}'")]
    MissingField(&'static str),

    #[error("Field '{field}' is not a valid number: '{value}'")]
    InvalidNumber { field: &'static str, value: String },

    #[error("Field '{field}' is not a valid date: '{value}'")]
    InvalidDate { field: &'static str, value: String },

    #[error("Line {line}: quantity must be at least 1")]
    InvalidQuantity { line: usize },

    #[error("Field '{field}' must not be negative")]
    NegativePrice { field: &'static str },

    #[error("Sale {0} not found")]
    UnknownSale(SaleId),

    #[error(transparent)]
    Payment(#[from] PaymentError),
}

/// Errors that can occur while loading snapshots, talking to the backend or
/// writing output.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open, read or write a file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV output error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Malformed JSON in a snapshot file or response body
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The backend answered with a non-success status
    #[error("{url} returned {status}: {body}")]
    Status { status: u16, url: String, body: String },

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Rejected form input
    #[error("{0}")]
    Form(#[from] FormError),

    /// Bad command-line invocation
    #[error("{0}")]
    Usage(String),
}

impl From<PaymentError> for Error {
    fn from(e: PaymentError) -> Self {
        Error::Form(FormError::Payment(e))
    }
}
