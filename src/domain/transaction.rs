use super::biller::BillerId;
use super::gateway::{GatewayId, Urgency};
use super::money::Amount;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Completed,
    Failed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Completed => "COMPLETED",
            TransactionStatus::Failed => "FAILED",
        }
    }
}

/// A charge routed through a gateway.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Transaction {
    pub code: String,
    pub biller_id: BillerId,
    pub gateway_id: GatewayId,
    pub amount: Amount,
    pub commission: Decimal,
    pub urgency: Urgency,
    pub status: TransactionStatus,
    pub processing_time: String,
    pub created_at: NaiveDateTime,
    pub completed_at: Option<NaiveDateTime>,
}

impl Transaction {
    pub fn generate_code() -> String {
        format!("TXN-{}", uuid::Uuid::new_v4())
    }
}
