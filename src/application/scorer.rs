use super::filter::Candidate;
use crate::domain::gateway::Gateway;
use crate::domain::money::Amount;
use rust_decimal::Decimal;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoredGateway {
    pub gateway: Gateway,
    pub commission: Decimal,
    pub remaining_quota: Decimal,
}

/// `None` when the gateway's commission for `amount` is out of range.
pub fn score_candidate(candidate: Candidate, amount: Amount) -> Option<ScoredGateway> {
    let commission = candidate.gateway.commission_for(amount)?;
    Some(ScoredGateway {
        commission,
        remaining_quota: candidate.remaining_quota,
        gateway: candidate.gateway,
    })
}

/// Cheapest first; equal commissions prefer more remaining quota.
///
/// `sort_by` is stable, so gateways equal on both keys stay in catalog order.
pub fn rank_candidates(candidates: Vec<Candidate>, amount: Amount) -> Vec<ScoredGateway> {
    let mut ranked: Vec<ScoredGateway> = candidates
        .into_iter()
        .filter_map(|candidate| {
            let code = candidate.gateway.code.clone();
            let scored = score_candidate(candidate, amount);
            if scored.is_none() {
                tracing::debug!(gateway = %code, %amount, "commission out of range, skipping");
            }
            scored
        })
        .collect();

    ranked.sort_by(|a, b| {
        a.commission
            .cmp(&b.commission)
            .then_with(|| b.remaining_quota.cmp(&a.remaining_quota))
    });
    ranked
}
