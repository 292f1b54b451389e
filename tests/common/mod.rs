#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use payrouter::application::recorder::ChargeRequest;
use payrouter::application::router::{PaymentRequest, RoutingEngine};
use payrouter::domain::biller::Biller;
use payrouter::domain::gateway::{AvailabilityWindow, DaySpec, Gateway, Urgency};
use payrouter::domain::money::Amount;
use payrouter::infrastructure::in_memory::{InMemoryCatalog, InMemoryLedger};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;

pub const BILLER: &str = "BILL_1";

/// 2024-01-01 is a Monday.
pub fn monday_at(hour: u32, minute: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
}

pub fn gateway(id: u32, code: &str, fixed: Decimal, percentage: Decimal) -> Gateway {
    Gateway {
        id,
        code: code.to_string(),
        name: format!("{} Gateway", code),
        commission_fixed: fixed,
        commission_percentage: percentage,
        min_transaction: dec!(0),
        max_transaction: dec!(0),
        daily_limit: dec!(100000),
        processing_time: 0,
        active: true,
        created_at: None,
        updated_at: None,
    }
}

pub fn office_hours(day: DaySpec) -> AvailabilityWindow {
    AvailabilityWindow::between(
        day,
        NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
        NaiveTime::from_hms_opt(20, 0, 0).unwrap(),
    )
}

pub struct Fixture {
    pub catalog: Arc<InMemoryCatalog>,
    pub ledger: Arc<InMemoryLedger>,
    pub engine: RoutingEngine,
}

/// Builds an engine over the given gateways with a single biller, `BILL_1`.
pub async fn fixture(gateways: Vec<(Gateway, Vec<AvailabilityWindow>)>) -> Fixture {
    let catalog = InMemoryCatalog::new();
    for (gateway, windows) in gateways {
        catalog.upsert_gateway(gateway, windows).await;
    }
    catalog
        .upsert_biller(Biller {
            id: 1,
            code: BILLER.to_string(),
            name: "Cairo Electricity".to_string(),
            email: None,
        })
        .await;

    let catalog = Arc::new(catalog);
    let ledger = Arc::new(InMemoryLedger::new());
    let engine = RoutingEngine::new(catalog.clone(), catalog.clone(), ledger.clone());
    Fixture {
        catalog,
        ledger,
        engine,
    }
}

pub fn payment(amount: Decimal, urgency: Urgency) -> PaymentRequest {
    PaymentRequest {
        biller_code: BILLER.to_string(),
        amount: Amount::new(amount).unwrap(),
        urgency,
    }
}

pub fn charge(gateway: &str, amount: Decimal) -> ChargeRequest {
    ChargeRequest {
        biller_code: BILLER.to_string(),
        gateway_code: gateway.to_string(),
        amount: Amount::new(amount).unwrap(),
        urgency: Urgency::CanWait,
    }
}
