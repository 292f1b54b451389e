use crate::domain::biller::Biller;
use crate::domain::gateway::GatewayId;
use crate::domain::money::round_money;
use crate::domain::ports::{BillerStoreRef, CatalogStoreRef, QuotaLedgerRef, TransactionStoreRef};
use crate::domain::quota::{DailyQuota, QuotaKey};
use crate::domain::transaction::Transaction;
use crate::error::{Result, RoutingError};
use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayQuota {
    pub gateway_code: String,
    pub gateway_name: String,
    pub daily_limit: Decimal,
    pub used_amount: Decimal,
    pub remaining_amount: Decimal,
    pub transaction_count: u32,
    pub utilization_percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuotaReport {
    pub biller_code: String,
    pub quota_date: NaiveDate,
    pub quotas: Vec<GatewayQuota>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewaySummary {
    pub gateway_code: String,
    pub gateway_name: String,
    pub transaction_count: usize,
    pub total_amount: Decimal,
    pub total_commission: Decimal,
    pub average_commission: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionSummary {
    pub biller_code: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub total_transactions: usize,
    pub total_amount: Decimal,
    pub total_commission: Decimal,
    pub by_gateway: Vec<GatewaySummary>,
    pub by_status: BTreeMap<String, usize>,
}

/// Read-only views over the ledger for dashboards and reconciliation.
#[derive(Clone)]
pub struct ReportingService {
    catalog: CatalogStoreRef,
    billers: BillerStoreRef,
    ledger: QuotaLedgerRef,
    transactions: TransactionStoreRef,
}

impl ReportingService {
    pub fn new(
        catalog: CatalogStoreRef,
        billers: BillerStoreRef,
        ledger: QuotaLedgerRef,
        transactions: TransactionStoreRef,
    ) -> Self {
        Self {
            catalog,
            billers,
            ledger,
            transactions,
        }
    }

    /// Quota usage of every active gateway for the biller on `date`.
    pub async fn quota_report(&self, biller_code: &str, date: NaiveDate) -> Result<QuotaReport> {
        let biller = self.resolve_biller(biller_code).await?;
        let mut used: BTreeMap<GatewayId, DailyQuota> = self
            .ledger
            .for_biller(biller.id, date)
            .await?
            .into_iter()
            .map(|q| (q.key.gateway_id, q))
            .collect();

        let quotas = self
            .catalog
            .active_gateways()
            .await?
            .into_iter()
            .map(|gateway| {
                let quota = used.remove(&gateway.id).unwrap_or_else(|| {
                    DailyQuota::new(QuotaKey::new(biller.id, gateway.id, date), gateway.daily_limit)
                });
                GatewayQuota {
                    gateway_code: gateway.code,
                    gateway_name: gateway.name,
                    daily_limit: quota.daily_limit,
                    used_amount: quota.total_amount,
                    remaining_amount: quota.remaining(),
                    transaction_count: quota.transaction_count,
                    utilization_percentage: quota.utilization_percentage(),
                }
            })
            .collect();

        Ok(QuotaReport {
            biller_code: biller.code,
            quota_date: date,
            quotas,
        })
    }

    /// A biller's transactions, restricted to one calendar day when `date` is given.
    pub async fn transactions(
        &self,
        biller_code: &str,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Transaction>> {
        let biller = self.resolve_biller(biller_code).await?;
        let (from, to) = match date {
            Some(day) => day_range(day, day)?,
            None => (NaiveDateTime::MIN, NaiveDateTime::MAX),
        };
        self.transactions.for_biller(biller.id, from, to).await
    }

    /// Totals over the inclusive range `[start, end]`.
    pub async fn summary(
        &self,
        biller_code: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<TransactionSummary> {
        if end < start {
            return Err(RoutingError::ValidationError(format!(
                "end date {} is before start date {}",
                end, start
            )));
        }
        let biller = self.resolve_biller(biller_code).await?;
        let (from, to) = day_range(start, end)?;
        let transactions = self.transactions.for_biller(biller.id, from, to).await?;

        let mut grouped: BTreeMap<GatewayId, Vec<&Transaction>> = BTreeMap::new();
        let mut by_status: BTreeMap<String, usize> = BTreeMap::new();
        for tx in &transactions {
            grouped.entry(tx.gateway_id).or_default().push(tx);
            *by_status.entry(tx.status.as_str().to_string()).or_default() += 1;
        }

        let mut by_gateway = Vec::with_capacity(grouped.len());
        for (gateway_id, txs) in grouped {
            let gateway = self.catalog.find_gateway(gateway_id).await?;
            let total_amount: Decimal = txs.iter().map(|t| t.amount.value()).sum();
            let total_commission: Decimal = txs.iter().map(|t| t.commission).sum();
            by_gateway.push(GatewaySummary {
                gateway_code: gateway
                    .as_ref()
                    .map_or_else(|| "UNKNOWN".to_string(), |g| g.code.clone()),
                gateway_name: gateway
                    .as_ref()
                    .map_or_else(|| "Unknown Gateway".to_string(), |g| g.name.clone()),
                transaction_count: txs.len(),
                total_amount,
                total_commission,
                average_commission: round_money(total_commission / Decimal::from(txs.len())),
            });
        }

        Ok(TransactionSummary {
            biller_code: biller.code,
            start_date: start,
            end_date: end,
            total_transactions: transactions.len(),
            total_amount: transactions.iter().map(|t| t.amount.value()).sum(),
            total_commission: transactions.iter().map(|t| t.commission).sum(),
            by_gateway,
            by_status,
        })
    }

    async fn resolve_biller(&self, code: &str) -> Result<Biller> {
        self.billers
            .find_biller_by_code(code)
            .await?
            .ok_or_else(|| RoutingError::BillerNotFound {
                code: code.to_string(),
            })
    }
}

/// Half-open datetime range covering whole days `start..=end`.
fn day_range(start: NaiveDate, end: NaiveDate) -> Result<(NaiveDateTime, NaiveDateTime)> {
    let after_end = end
        .succ_opt()
        .ok_or_else(|| RoutingError::ValidationError(format!("date {} is out of range", end)))?;
    Ok((
        start.and_time(chrono::NaiveTime::MIN),
        after_end.and_time(chrono::NaiveTime::MIN),
    ))
}
