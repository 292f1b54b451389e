use crate::domain::gateway::{Gateway, Urgency};
use crate::domain::money::Amount;
use crate::domain::ports::{BillerStoreRef, CatalogStoreRef, CommitOutcome, QuotaLedgerRef};
use crate::domain::quota::{DailyQuota, QuotaKey};
use crate::domain::transaction::{Transaction, TransactionStatus};
use crate::error::{Result, RoutingError};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A direct charge against a named gateway.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ChargeRequest {
    pub biller_code: String,
    pub gateway_code: String,
    pub amount: Amount,
    pub urgency: Urgency,
}

/// A committed transaction together with the quota state it produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionRecord {
    pub transaction: Transaction,
    pub biller_code: String,
    pub gateway_code: String,
    pub gateway_name: String,
    pub quota: DailyQuota,
}

impl TransactionRecord {
    pub fn remaining_quota(&self) -> Decimal {
        self.quota.remaining()
    }
}

/// Commits charges: one transaction row plus one quota increment, atomically.
///
/// Every hard constraint is re-checked here against the current catalog, because
/// the gateway may have changed since a routing decision was made. The ledger's
/// conditional increment is the authoritative quota check.
#[derive(Clone)]
pub struct TransactionRecorder {
    catalog: CatalogStoreRef,
    billers: BillerStoreRef,
    ledger: QuotaLedgerRef,
}

impl TransactionRecorder {
    pub fn new(catalog: CatalogStoreRef, billers: BillerStoreRef, ledger: QuotaLedgerRef) -> Self {
        Self {
            catalog,
            billers,
            ledger,
        }
    }

    /// Charges the gateway, computing commission from its current terms.
    pub async fn charge(
        &self,
        request: &ChargeRequest,
        now: NaiveDateTime,
    ) -> Result<TransactionRecord> {
        self.commit(request, None, now).await
    }

    /// Charges the gateway with a commission computed by the caller, e.g. the
    /// estimate shown in a recommendation.
    pub async fn charge_with_commission(
        &self,
        request: &ChargeRequest,
        commission: Decimal,
        now: NaiveDateTime,
    ) -> Result<TransactionRecord> {
        self.commit(request, Some(commission), now).await
    }

    async fn commit(
        &self,
        request: &ChargeRequest,
        commission: Option<Decimal>,
        now: NaiveDateTime,
    ) -> Result<TransactionRecord> {
        tracing::info!(
            biller = %request.biller_code,
            gateway = %request.gateway_code,
            amount = %request.amount,
            "creating transaction"
        );

        let biller = self
            .billers
            .find_biller_by_code(&request.biller_code)
            .await?
            .ok_or_else(|| RoutingError::BillerNotFound {
                code: request.biller_code.clone(),
            })?;

        let gateway = self
            .catalog
            .find_gateway_by_code(&request.gateway_code)
            .await?
            .ok_or_else(|| RoutingError::GatewayNotFound {
                code: request.gateway_code.clone(),
            })?;

        validate_gateway(&gateway, request.amount)?;

        let commission = match commission {
            Some(c) if c < Decimal::ZERO => {
                return Err(RoutingError::InvalidTransaction {
                    gateway: gateway.code.clone(),
                    reason: format!("commission {} must not be negative", c),
                });
            }
            Some(c) => c,
            None => gateway.commission_for(request.amount).ok_or_else(|| {
                RoutingError::InvalidTransaction {
                    gateway: gateway.code.clone(),
                    reason: format!("commission for amount {} is out of range", request.amount),
                }
            })?,
        };

        let transaction = Transaction {
            code: Transaction::generate_code(),
            biller_id: biller.id,
            gateway_id: gateway.id,
            amount: request.amount,
            commission,
            urgency: request.urgency,
            status: TransactionStatus::Completed,
            processing_time: gateway.processing_time_label(),
            created_at: now,
            completed_at: Some(now),
        };

        let key = QuotaKey::new(biller.id, gateway.id, now.date());
        match self
            .ledger
            .commit(transaction.clone(), key, gateway.daily_limit)
            .await?
        {
            CommitOutcome::Committed(quota) => {
                tracing::info!(
                    transaction = %transaction.code,
                    gateway = %gateway.code,
                    used = %quota.total_amount,
                    limit = %quota.daily_limit,
                    "transaction committed"
                );
                Ok(TransactionRecord {
                    transaction,
                    biller_code: biller.code,
                    gateway_code: gateway.code,
                    gateway_name: gateway.name,
                    quota,
                })
            }
            CommitOutcome::QuotaExceeded { remaining } => {
                tracing::info!(
                    gateway = %gateway.code,
                    requested = %request.amount,
                    %remaining,
                    "charge rejected by quota ledger"
                );
                Err(RoutingError::InsufficientQuota {
                    gateway: gateway.code,
                    requested: request.amount.value(),
                    remaining,
                })
            }
        }
    }
}

fn validate_gateway(gateway: &Gateway, amount: Amount) -> Result<()> {
    if !gateway.active {
        return Err(RoutingError::InvalidTransaction {
            gateway: gateway.code.clone(),
            reason: format!("gateway is not active: {}", gateway.name),
        });
    }
    gateway
        .check_amount(amount)
        .map_err(|reason| RoutingError::InvalidTransaction {
            gateway: gateway.code.clone(),
            reason,
        })
}
