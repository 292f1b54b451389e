use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RoutingError {
    #[error("Biller not found: {code}")]
    BillerNotFound { code: String },
    #[error("Gateway not found: {code}")]
    GatewayNotFound { code: String },
    #[error("No available gateway found for amount: {amount}")]
    NoAvailableGateway { amount: Decimal },
    #[error("Invalid transaction on gateway {gateway}: {reason}")]
    InvalidTransaction { gateway: String, reason: String },
    #[error(
        "Insufficient daily quota on gateway {gateway}. Requested: {requested}, remaining: {remaining}"
    )]
    InsufficientQuota {
        gateway: String,
        requested: Decimal,
        remaining: Decimal,
    },
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Catalog error: {0}")]
    CatalogError(String),
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Internal error: {0}")]
    InternalError(Box<dyn std::error::Error + Send + Sync>),
}

impl RoutingError {
    /// True for the business-rule rejections a caller is expected to handle.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            RoutingError::BillerNotFound { .. }
                | RoutingError::GatewayNotFound { .. }
                | RoutingError::NoAvailableGateway { .. }
                | RoutingError::InvalidTransaction { .. }
                | RoutingError::InsufficientQuota { .. }
        )
    }
}

impl From<serde_json::Error> for RoutingError {
    fn from(e: serde_json::Error) -> Self {
        RoutingError::InternalError(Box::new(e))
    }
}

#[cfg(feature = "storage-rocksdb")]
impl From<rocksdb::Error> for RoutingError {
    fn from(e: rocksdb::Error) -> Self {
        RoutingError::InternalError(Box::new(e))
    }
}

pub type Result<T> = std::result::Result<T, RoutingError>;
