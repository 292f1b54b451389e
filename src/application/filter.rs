//! Hard eligibility checks applied to the active catalog for one payment request.
//!
//! Everything here is synchronous and side-effect free: the engine fetches
//! availability windows and remaining quota up front and passes the clock in,
//! so the same inputs always produce the same eligible set.

use crate::domain::gateway::{AvailabilityWindow, Gateway, Urgency};
use crate::domain::money::Amount;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use std::fmt;

/// A gateway together with the per-request state the checks need.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub gateway: Gateway,
    pub windows: Vec<AvailabilityWindow>,
    /// `daily_limit - total` for today, or the full limit when no ledger row exists.
    pub remaining_quota: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Exclusion {
    AmountOutOfBounds(String),
    Unavailable,
    QuotaExhausted { remaining: Decimal },
}

impl fmt::Display for Exclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Exclusion::AmountOutOfBounds(reason) => write!(f, "{}", reason),
            Exclusion::Unavailable => write!(f, "outside availability window"),
            Exclusion::QuotaExhausted { remaining } => {
                write!(f, "insufficient quota, remaining {}", remaining)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterOutcome {
    /// Gateways passing every check, in catalog order.
    pub eligible: Vec<Candidate>,
    pub excluded: Vec<(String, Exclusion)>,
}

pub fn is_available_at(windows: &[AvailabilityWindow], at: NaiveDateTime) -> bool {
    windows.iter().any(|w| w.is_open_at(at))
}

pub fn has_headroom(remaining_quota: Decimal, amount: Amount) -> bool {
    amount.value() <= remaining_quota
}

fn check(candidate: &Candidate, amount: Amount, now: NaiveDateTime) -> Result<(), Exclusion> {
    candidate
        .gateway
        .check_amount(amount)
        .map_err(Exclusion::AmountOutOfBounds)?;
    if !is_available_at(&candidate.windows, now) {
        return Err(Exclusion::Unavailable);
    }
    if !has_headroom(candidate.remaining_quota, amount) {
        return Err(Exclusion::QuotaExhausted {
            remaining: candidate.remaining_quota,
        });
    }
    Ok(())
}

/// Applies the amount, availability and quota checks, keeping catalog order.
pub fn filter_candidates(
    candidates: Vec<Candidate>,
    amount: Amount,
    now: NaiveDateTime,
) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();
    for candidate in candidates {
        match check(&candidate, amount, now) {
            Ok(()) => outcome.eligible.push(candidate),
            Err(reason) => {
                tracing::debug!(
                    gateway = %candidate.gateway.code,
                    %amount,
                    "gateway rejected: {}",
                    reason
                );
                outcome.excluded.push((candidate.gateway.code.clone(), reason));
            }
        }
    }
    outcome
}

/// Keeps only zero-processing-time gateways for INSTANT requests.
///
/// Urgency is a preference: when no instant gateway is eligible the full set is
/// returned and the second element is `true`.
pub fn narrow_by_urgency(eligible: Vec<Candidate>, urgency: Urgency) -> (Vec<Candidate>, bool) {
    if urgency != Urgency::Instant {
        return (eligible, false);
    }

    let instant: Vec<Candidate> = eligible
        .iter()
        .filter(|c| c.gateway.is_instant())
        .cloned()
        .collect();

    if instant.is_empty() {
        if !eligible.is_empty() {
            tracing::warn!(
                eligible = eligible.len(),
                "no instant gateways available, using all eligible gateways"
            );
        }
        (eligible, true)
    } else {
        tracing::debug!(instant = instant.len(), "urgency INSTANT narrowed candidates");
        (instant, false)
    }
}
