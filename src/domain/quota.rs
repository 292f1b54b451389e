use super::biller::BillerId;
use super::gateway::GatewayId;
use super::money::{Amount, round_money};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifies one daily spending counter.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Hash, Clone, Copy)]
pub struct QuotaKey {
    pub biller_id: BillerId,
    pub gateway_id: GatewayId,
    pub quota_date: NaiveDate,
}

impl QuotaKey {
    pub fn new(biller_id: BillerId, gateway_id: GatewayId, quota_date: NaiveDate) -> Self {
        Self {
            biller_id,
            gateway_id,
            quota_date,
        }
    }
}

/// Cumulative spend of a biller on a gateway for one calendar day.
///
/// `daily_limit` is the gateway's limit snapshotted when the row was first created;
/// later catalog changes do not move the cap of a day already in progress.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct DailyQuota {
    pub key: QuotaKey,
    pub total_amount: Decimal,
    pub transaction_count: u32,
    pub daily_limit: Decimal,
}

impl DailyQuota {
    pub fn new(key: QuotaKey, daily_limit: Decimal) -> Self {
        Self {
            key,
            total_amount: Decimal::ZERO,
            transaction_count: 0,
            daily_limit,
        }
    }

    pub fn remaining(&self) -> Decimal {
        self.daily_limit - self.total_amount
    }

    pub fn can_absorb(&self, amount: Amount) -> bool {
        amount.value() <= self.remaining()
    }

    /// Adds a charge without checking the limit; callers check `can_absorb` first.
    pub fn apply(&mut self, amount: Amount) {
        self.total_amount += amount.value();
        self.transaction_count += 1;
    }

    pub fn utilization_percentage(&self) -> Decimal {
        if self.daily_limit.is_zero() {
            return Decimal::ZERO;
        }
        round_money(self.total_amount / self.daily_limit * Decimal::ONE_HUNDRED)
    }
}
