use super::biller::{Biller, BillerId};
use super::gateway::{AvailabilityWindow, Gateway, GatewayId};
use super::quota::{DailyQuota, QuotaKey};
use super::transaction::Transaction;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::sync::Arc;

/// Read-only view of the gateway catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Active gateways in catalog order.
    async fn active_gateways(&self) -> Result<Vec<Gateway>>;
    async fn availability_windows(&self, gateway_id: GatewayId) -> Result<Vec<AvailabilityWindow>>;
    async fn find_gateway_by_code(&self, code: &str) -> Result<Option<Gateway>>;
    async fn find_gateway(&self, gateway_id: GatewayId) -> Result<Option<Gateway>>;
}

#[async_trait]
pub trait BillerStore: Send + Sync {
    async fn find_biller_by_code(&self, code: &str) -> Result<Option<Biller>>;
}

/// Result of an atomic conditional quota increment.
#[derive(Debug, PartialEq, Clone)]
pub enum CommitOutcome {
    /// The transaction was stored and the quota row now holds this state.
    Committed(DailyQuota),
    /// Nothing was written; `remaining` is the headroom observed under the lock.
    QuotaExceeded { remaining: Decimal },
}

/// Per (biller, gateway, day) spending counters.
#[async_trait]
pub trait QuotaLedger: Send + Sync {
    async fn get(&self, key: &QuotaKey) -> Result<Option<DailyQuota>>;
    async fn for_biller(&self, biller_id: BillerId, date: NaiveDate) -> Result<Vec<DailyQuota>>;

    /// Stores `transaction` and adds its amount to the quota row for `key` as one unit.
    ///
    /// The row is created with `daily_limit` when absent. The write is rejected with
    /// [`CommitOutcome::QuotaExceeded`] when `total + amount` would pass the row's limit;
    /// concurrent commits against the same key are linearized.
    async fn commit(
        &self,
        transaction: Transaction,
        key: QuotaKey,
        daily_limit: Decimal,
    ) -> Result<CommitOutcome>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn get(&self, code: &str) -> Result<Option<Transaction>>;
    /// Transactions of a biller created in `[from, to)`, oldest first.
    async fn for_biller(
        &self,
        biller_id: BillerId,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Transaction>>;
}

pub type CatalogStoreRef = Arc<dyn CatalogStore>;
pub type BillerStoreRef = Arc<dyn BillerStore>;
pub type QuotaLedgerRef = Arc<dyn QuotaLedger>;
pub type TransactionStoreRef = Arc<dyn TransactionStore>;
