use super::filter::{Candidate, filter_candidates, narrow_by_urgency};
use super::recorder::{ChargeRequest, TransactionRecord, TransactionRecorder};
use super::scorer::{ScoredGateway, rank_candidates};
use crate::domain::biller::Biller;
use crate::domain::gateway::{Gateway, Urgency};
use crate::domain::money::Amount;
use crate::domain::ports::{BillerStoreRef, CatalogStoreRef, QuotaLedgerRef};
use crate::domain::quota::QuotaKey;
use crate::error::{Result, RoutingError};
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const MAX_ALTERNATIVES: usize = 2;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PaymentRequest {
    pub biller_code: String,
    pub amount: Amount,
    pub urgency: Urgency,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedGateway {
    pub code: String,
    pub name: String,
    pub estimated_commission: Decimal,
    pub urgency: Urgency,
    pub remaining_quota: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlternativeGateway {
    pub code: String,
    pub name: String,
    pub estimated_commission: Decimal,
    pub urgency: Urgency,
    pub processing_time: String,
}

/// Outcome of routing a request, before anything is charged.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub recommended_gateway: RecommendedGateway,
    pub alternatives: Vec<AlternativeGateway>,
    pub reason: String,
    /// Set when an INSTANT request found no instant gateway and used the full eligible set.
    pub instant_fallback: bool,
    #[serde(skip)]
    pub ranked: Vec<ScoredGateway>,
}

/// A decision that has been charged against the selected gateway.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    pub decision: Decision,
    pub transaction: TransactionRecord,
}

/// Picks the cheapest eligible gateway for a payment.
///
/// [`RoutingEngine::decide`] only reads; [`RoutingEngine::recommend`] composes it with
/// [`TransactionRecorder::charge_with_commission`] to commit the winner.
#[derive(Clone)]
pub struct RoutingEngine {
    catalog: CatalogStoreRef,
    billers: BillerStoreRef,
    ledger: QuotaLedgerRef,
    recorder: TransactionRecorder,
}

impl RoutingEngine {
    pub fn new(catalog: CatalogStoreRef, billers: BillerStoreRef, ledger: QuotaLedgerRef) -> Self {
        let recorder = TransactionRecorder::new(catalog.clone(), billers.clone(), ledger.clone());
        Self {
            catalog,
            billers,
            ledger,
            recorder,
        }
    }

    pub fn recorder(&self) -> &TransactionRecorder {
        &self.recorder
    }

    /// Filters, narrows and ranks the active catalog for `request` as of `now`.
    pub async fn decide(&self, request: &PaymentRequest, now: NaiveDateTime) -> Result<Decision> {
        tracing::info!(
            biller = %request.biller_code,
            amount = %request.amount,
            urgency = request.urgency.as_str(),
            "starting gateway recommendation"
        );

        let biller = self.resolve_biller(&request.biller_code).await?;
        let candidates = self.load_candidates(&biller, now).await?;
        tracing::debug!(active = candidates.len(), "loaded active gateways");

        let outcome = filter_candidates(candidates, request.amount, now);
        tracing::debug!(
            eligible = outcome.eligible.len(),
            excluded = outcome.excluded.len(),
            "after hard filters"
        );

        let (narrowed, instant_fallback) = narrow_by_urgency(outcome.eligible, request.urgency);
        if narrowed.is_empty() {
            return Err(RoutingError::NoAvailableGateway {
                amount: request.amount.value(),
            });
        }

        let ranked = rank_candidates(narrowed, request.amount);
        if ranked.is_empty() {
            return Err(RoutingError::NoAvailableGateway {
                amount: request.amount.value(),
            });
        }
        let decision = build_decision(ranked, instant_fallback)?;
        tracing::info!(
            gateway = %decision.recommended_gateway.code,
            commission = %decision.recommended_gateway.estimated_commission,
            candidates = decision.ranked.len(),
            "selected gateway"
        );
        Ok(decision)
    }

    /// Decides, then charges the winning gateway at the quoted commission.
    pub async fn recommend(
        &self,
        request: &PaymentRequest,
        now: NaiveDateTime,
    ) -> Result<Recommendation> {
        let decision = self.decide(request, now).await?;
        let charge = ChargeRequest {
            biller_code: request.biller_code.clone(),
            gateway_code: decision.recommended_gateway.code.clone(),
            amount: request.amount,
            urgency: request.urgency,
        };
        let transaction = self
            .recorder
            .charge_with_commission(&charge, decision.recommended_gateway.estimated_commission, now)
            .await?;
        Ok(Recommendation {
            decision,
            transaction,
        })
    }

    pub async fn quote_commission(&self, gateway_code: &str, amount: Amount) -> Result<Decimal> {
        let gateway = self
            .catalog
            .find_gateway_by_code(gateway_code)
            .await?
            .ok_or_else(|| RoutingError::GatewayNotFound {
                code: gateway_code.to_string(),
            })?;
        gateway
            .commission_for(amount)
            .ok_or_else(|| RoutingError::InvalidTransaction {
                reason: format!("commission for amount {} is out of range", amount),
                gateway: gateway.code,
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

    async fn load_candidates(&self, biller: &Biller, now: NaiveDateTime) -> Result<Vec<Candidate>> {
        let gateways = self.catalog.active_gateways().await?;
        let mut candidates = Vec::with_capacity(gateways.len());
        for gateway in gateways {
            let windows = self.catalog.availability_windows(gateway.id).await?;
            let remaining_quota = self.remaining_quota(biller, &gateway, now).await?;
            candidates.push(Candidate {
                gateway,
                windows,
                remaining_quota,
            });
        }
        Ok(candidates)
    }

    async fn remaining_quota(
        &self,
        biller: &Biller,
        gateway: &Gateway,
        now: NaiveDateTime,
    ) -> Result<Decimal> {
        let key = QuotaKey::new(biller.id, gateway.id, now.date());
        Ok(self
            .ledger
            .get(&key)
            .await?
            .map(|quota| quota.remaining())
            .unwrap_or(gateway.daily_limit))
    }
}

fn build_decision(ranked: Vec<ScoredGateway>, instant_fallback: bool) -> Result<Decision> {
    let best = ranked
        .first()
        .ok_or_else(|| RoutingError::InternalError("ranking produced no candidates".into()))?;

    let recommended_gateway = RecommendedGateway {
        code: best.gateway.code.clone(),
        name: best.gateway.name.clone(),
        estimated_commission: best.commission,
        urgency: best.gateway.settlement_urgency(),
        remaining_quota: best.remaining_quota,
    };

    let alternatives = ranked
        .iter()
        .skip(1)
        .take(MAX_ALTERNATIVES)
        .map(|s| AlternativeGateway {
            code: s.gateway.code.clone(),
            name: s.gateway.name.clone(),
            estimated_commission: s.commission,
            urgency: s.gateway.settlement_urgency(),
            processing_time: s.gateway.processing_time_label(),
        })
        .collect();

    let mut reason = format!(
        "Lowest commission ({:.2}) among {} eligible gateway(s)",
        best.commission,
        ranked.len()
    );
    if instant_fallback {
        reason.push_str("; no instant gateway was available");
    }

    Ok(Decision {
        recommended_gateway,
        alternatives,
        reason,
        instant_fallback,
        ranked,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gateway::AvailabilityWindow;
    use crate::infrastructure::in_memory::{InMemoryCatalog, InMemoryLedger};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use std::sync::Arc;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    fn gateway(id: u32, code: &str, fixed: Decimal, processing_time: u32) -> Gateway {
        Gateway {
            id,
            code: code.to_string(),
            name: format!("{} gateway", code),
            commission_fixed: fixed,
            commission_percentage: dec!(0),
            min_transaction: dec!(1),
            max_transaction: dec!(10000),
            daily_limit: dec!(5000),
            processing_time,
            active: true,
            created_at: None,
            updated_at: None,
        }
    }

    async fn engine(gateways: Vec<Gateway>) -> RoutingEngine {
        let catalog = InMemoryCatalog::new();
        for g in gateways {
            catalog
                .upsert_gateway(g, vec![AvailabilityWindow::always()])
                .await;
        }
        catalog
            .upsert_biller(Biller {
                id: 1,
                code: "BILL_1".to_string(),
                name: "Water".to_string(),
                email: Some("water@example.com".to_string()),
            })
            .await;
        let catalog = Arc::new(catalog);
        RoutingEngine::new(catalog.clone(), catalog, Arc::new(InMemoryLedger::new()))
    }

    fn request(amount: Decimal, urgency: Urgency) -> PaymentRequest {
        PaymentRequest {
            biller_code: "BILL_1".to_string(),
            amount: Amount::new(amount).unwrap(),
            urgency,
        }
    }

    #[tokio::test]
    async fn test_decide_selects_cheapest_with_two_alternatives() {
        let engine = engine(vec![
            gateway(1, "D", dec!(4), 0),
            gateway(2, "A", dec!(1), 0),
            gateway(3, "C", dec!(3), 0),
            gateway(4, "B", dec!(2), 0),
        ])
        .await;

        let decision = engine
            .decide(&request(dec!(100), Urgency::CanWait), now())
            .await
            .unwrap();
        assert_eq!(decision.recommended_gateway.code, "A");
        assert_eq!(decision.recommended_gateway.remaining_quota, dec!(5000));
        let alternatives: Vec<&str> = decision.alternatives.iter().map(|a| a.code.as_str()).collect();
        assert_eq!(alternatives, vec!["B", "C"]);
        assert_eq!(decision.reason, "Lowest commission (1.00) among 4 eligible gateway(s)");
        assert!(!decision.instant_fallback);
    }

    #[tokio::test]
    async fn test_decide_has_no_side_effects() {
        let engine = engine(vec![gateway(1, "A", dec!(1), 0)]).await;
        let req = request(dec!(100), Urgency::CanWait);
        let first = engine.decide(&req, now()).await.unwrap();
        let second = engine.decide(&req, now()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_instant_prefers_instant_gateway_over_cheaper_slow_one() {
        let engine = engine(vec![
            gateway(1, "SLOW", dec!(0.50), 86400),
            gateway(2, "FAST", dec!(3), 0),
        ])
        .await;

        let decision = engine
            .decide(&request(dec!(100), Urgency::Instant), now())
            .await
            .unwrap();
        assert_eq!(decision.recommended_gateway.code, "FAST");
        assert!(decision.alternatives.is_empty());

        let decision = engine
            .decide(&request(dec!(100), Urgency::CanWait), now())
            .await
            .unwrap();
        assert_eq!(decision.recommended_gateway.code, "SLOW");
        assert_eq!(decision.alternatives[0].processing_time, "0 seconds");
    }

    #[tokio::test]
    async fn test_instant_fallback_is_flagged() {
        let engine = engine(vec![gateway(1, "SLOW", dec!(1), 600)]).await;
        let decision = engine
            .decide(&request(dec!(100), Urgency::Instant), now())
            .await
            .unwrap();
        assert_eq!(decision.recommended_gateway.code, "SLOW");
        assert_eq!(decision.recommended_gateway.urgency, Urgency::CanWait);
        assert!(decision.instant_fallback);
        assert!(decision.reason.contains("no instant gateway"));
    }

    #[tokio::test]
    async fn test_no_available_gateway() {
        let engine = engine(vec![gateway(1, "A", dec!(1), 0)]).await;
        let err = engine
            .decide(&request(dec!(20000), Urgency::CanWait), now())
            .await
            .unwrap_err();
        assert!(matches!(err, RoutingError::NoAvailableGateway { amount } if amount == dec!(20000)));
    }

    #[tokio::test]
    async fn test_unknown_biller() {
        let engine = engine(vec![gateway(1, "A", dec!(1), 0)]).await;
        let mut req = request(dec!(100), Urgency::CanWait);
        req.biller_code = "GHOST".to_string();
        let err = engine.decide(&req, now()).await.unwrap_err();
        assert!(matches!(err, RoutingError::BillerNotFound { .. }));
    }

    #[tokio::test]
    async fn test_recommend_charges_and_moves_to_next_gateway_when_exhausted() {
        let engine = engine(vec![gateway(1, "A", dec!(1), 0), gateway(2, "B", dec!(2), 0)]).await;
        let req = request(dec!(3000), Urgency::CanWait);

        let first = engine.recommend(&req, now()).await.unwrap();
        assert_eq!(first.transaction.gateway_code, "A");
        assert_eq!(first.transaction.transaction.commission, dec!(1.00));
        assert_eq!(first.transaction.remaining_quota(), dec!(2000));

        // A has 2000 left, so the next 3000 goes to B.
        let second = engine.recommend(&req, now()).await.unwrap();
        assert_eq!(second.decision.recommended_gateway.code, "B");
        assert_eq!(second.transaction.gateway_code, "B");

        let err = engine.recommend(&req, now()).await.unwrap_err();
        assert!(matches!(err, RoutingError::NoAvailableGateway { .. }));
    }

    #[tokio::test]
    async fn test_quote_commission() {
        let engine = engine(vec![gateway(1, "A", dec!(1.25), 0)]).await;
        let quote = engine
            .quote_commission("A", Amount::new(dec!(10)).unwrap())
            .await
            .unwrap();
        assert_eq!(quote, dec!(1.25));
        assert!(matches!(
            engine.quote_commission("Z", Amount::new(dec!(10)).unwrap()).await,
            Err(RoutingError::GatewayNotFound { .. })
        ));
    }
}
