use crate::domain::biller::{Biller, BillerId};
use crate::domain::gateway::{AvailabilityWindow, Gateway, GatewayId};
use crate::domain::ports::{BillerStore, CatalogStore, CommitOutcome, QuotaLedger, TransactionStore};
use crate::domain::quota::{DailyQuota, QuotaKey};
use crate::domain::transaction::Transaction;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct CatalogEntry {
    gateway: Gateway,
    windows: Vec<AvailabilityWindow>,
}

#[derive(Default)]
struct CatalogState {
    // Vec keeps catalog order, which is the final ranking tie-break.
    gateways: Vec<CatalogEntry>,
    billers: HashMap<String, Biller>,
}

/// A thread-safe in-memory gateway and biller catalog.
///
/// Read-mostly: routing only reads, while [`InMemoryCatalog::upsert_gateway`] lets
/// administration (or a test) swap a gateway definition in place.
#[derive(Default, Clone)]
pub struct InMemoryCatalog {
    state: Arc<RwLock<CatalogState>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a gateway at the end of the catalog, or replaces the one with the same code.
    pub async fn upsert_gateway(&self, gateway: Gateway, windows: Vec<AvailabilityWindow>) {
        let mut state = self.state.write().await;
        let entry = CatalogEntry { gateway, windows };
        match state
            .gateways
            .iter_mut()
            .find(|e| e.gateway.code == entry.gateway.code)
        {
            Some(existing) => *existing = entry,
            None => state.gateways.push(entry),
        }
    }

    pub async fn upsert_biller(&self, biller: Biller) {
        let mut state = self.state.write().await;
        state.billers.insert(biller.code.clone(), biller);
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalog {
    async fn active_gateways(&self) -> Result<Vec<Gateway>> {
        let state = self.state.read().await;
        Ok(state
            .gateways
            .iter()
            .filter(|e| e.gateway.active)
            .map(|e| e.gateway.clone())
            .collect())
    }

    async fn availability_windows(&self, gateway_id: GatewayId) -> Result<Vec<AvailabilityWindow>> {
        let state = self.state.read().await;
        Ok(state
            .gateways
            .iter()
            .find(|e| e.gateway.id == gateway_id)
            .map(|e| e.windows.clone())
            .unwrap_or_default())
    }

    async fn find_gateway_by_code(&self, code: &str) -> Result<Option<Gateway>> {
        let state = self.state.read().await;
        Ok(state
            .gateways
            .iter()
            .find(|e| e.gateway.code == code)
            .map(|e| e.gateway.clone()))
    }

    async fn find_gateway(&self, gateway_id: GatewayId) -> Result<Option<Gateway>> {
        let state = self.state.read().await;
        Ok(state
            .gateways
            .iter()
            .find(|e| e.gateway.id == gateway_id)
            .map(|e| e.gateway.clone()))
    }
}

#[async_trait]
impl BillerStore for InMemoryCatalog {
    async fn find_biller_by_code(&self, code: &str) -> Result<Option<Biller>> {
        let state = self.state.read().await;
        Ok(state.billers.get(code).cloned())
    }
}

#[derive(Default)]
struct LedgerState {
    quotas: HashMap<QuotaKey, DailyQuota>,
    transactions: Vec<Transaction>,
}

/// A thread-safe in-memory quota ledger and transaction log.
///
/// Quota rows and transactions live behind a single lock, so a commit checks the
/// limit, appends the transaction and bumps the counter in one critical section.
#[derive(Default, Clone)]
pub struct InMemoryLedger {
    state: Arc<RwLock<LedgerState>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl QuotaLedger for InMemoryLedger {
    async fn get(&self, key: &QuotaKey) -> Result<Option<DailyQuota>> {
        let state = self.state.read().await;
        Ok(state.quotas.get(key).cloned())
    }

    async fn for_biller(&self, biller_id: BillerId, date: NaiveDate) -> Result<Vec<DailyQuota>> {
        let state = self.state.read().await;
        let mut quotas: Vec<DailyQuota> = state
            .quotas
            .values()
            .filter(|q| q.key.biller_id == biller_id && q.key.quota_date == date)
            .cloned()
            .collect();
        quotas.sort_by_key(|q| q.key.gateway_id);
        Ok(quotas)
    }

    async fn commit(
        &self,
        transaction: Transaction,
        key: QuotaKey,
        daily_limit: Decimal,
    ) -> Result<CommitOutcome> {
        let mut state = self.state.write().await;

        let mut quota = state
            .quotas
            .get(&key)
            .cloned()
            .unwrap_or_else(|| DailyQuota::new(key, daily_limit));

        if !quota.can_absorb(transaction.amount) {
            return Ok(CommitOutcome::QuotaExceeded {
                remaining: quota.remaining(),
            });
        }

        quota.apply(transaction.amount);
        state.transactions.push(transaction);
        state.quotas.insert(key, quota.clone());

        Ok(CommitOutcome::Committed(quota))
    }
}

#[async_trait]
impl TransactionStore for InMemoryLedger {
    async fn get(&self, code: &str) -> Result<Option<Transaction>> {
        let state = self.state.read().await;
        Ok(state.transactions.iter().find(|t| t.code == code).cloned())
    }

    async fn for_biller(
        &self,
        biller_id: BillerId,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> Result<Vec<Transaction>> {
        let state = self.state.read().await;
        let mut found: Vec<Transaction> = state
            .transactions
            .iter()
            .filter(|t| t.biller_id == biller_id && t.created_at >= from && t.created_at < to)
            .cloned()
            .collect();
        found.sort_by_key(|t| t.created_at);
        Ok(found)
    }
}
