use super::money::{Amount, round_money};
use crate::error::RoutingError;
use chrono::{Datelike, NaiveDateTime, NaiveTime, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type GatewayId = u32;

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Urgency {
    Instant,
    CanWait,
}

impl Urgency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Urgency::Instant => "INSTANT",
            Urgency::CanWait => "CAN_WAIT",
        }
    }
}

/// A downstream payment channel as held by the catalog.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Gateway {
    pub id: GatewayId,
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub commission_fixed: Decimal,
    /// Rate in `[0, 1]` applied to the payment amount.
    #[serde(default)]
    pub commission_percentage: Decimal,
    #[serde(default)]
    pub min_transaction: Decimal,
    /// Zero means no upper bound.
    #[serde(default)]
    pub max_transaction: Decimal,
    pub daily_limit: Decimal,
    /// Settlement delay in seconds; zero is instant.
    #[serde(default)]
    pub processing_time: u32,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default)]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub updated_at: Option<NaiveDateTime>,
}

fn default_active() -> bool {
    true
}

impl Gateway {
    pub fn validate(&self) -> Result<(), RoutingError> {
        let invalid = |reason: &str| {
            Err(RoutingError::CatalogError(format!(
                "gateway {}: {}",
                self.code, reason
            )))
        };

        if self.code.trim().is_empty() {
            return invalid("code must not be empty");
        }
        if self.commission_fixed < Decimal::ZERO {
            return invalid("commission_fixed must not be negative");
        }
        if self.commission_percentage < Decimal::ZERO || self.commission_percentage > Decimal::ONE
        {
            return invalid("commission_percentage must be within [0, 1]");
        }
        if self.min_transaction < Decimal::ZERO {
            return invalid("min_transaction must not be negative");
        }
        if self.has_upper_bound() && self.min_transaction >= self.max_transaction {
            return invalid("min_transaction must be below max_transaction");
        }
        if self.max_transaction < Decimal::ZERO {
            return invalid("max_transaction must not be negative");
        }
        if self.daily_limit <= Decimal::ZERO {
            return invalid("daily_limit must be positive");
        }
        Ok(())
    }

    pub fn has_upper_bound(&self) -> bool {
        self.max_transaction > Decimal::ZERO
    }

    /// Checks the exclusive transaction-size bounds, returning why the amount does not fit.
    pub fn check_amount(&self, amount: Amount) -> Result<(), String> {
        let value = amount.value();
        if value <= self.min_transaction {
            return Err(format!(
                "amount {} is not above minimum {}",
                value, self.min_transaction
            ));
        }
        if self.has_upper_bound() && value >= self.max_transaction {
            return Err(format!(
                "amount {} is not below maximum {}",
                value, self.max_transaction
            ));
        }
        Ok(())
    }

    /// `commission_fixed + commission_percentage * amount`, rounded to cents half-up.
    ///
    /// `None` when the commission does not fit in a `Decimal`.
    pub fn commission_for(&self, amount: Amount) -> Option<Decimal> {
        self.commission_percentage
            .checked_mul(amount.value())
            .and_then(|variable| variable.checked_add(self.commission_fixed))
            .map(round_money)
    }

    pub fn is_instant(&self) -> bool {
        self.processing_time == 0
    }

    pub fn settlement_urgency(&self) -> Urgency {
        if self.is_instant() {
            Urgency::Instant
        } else {
            Urgency::CanWait
        }
    }

    pub fn processing_time_label(&self) -> String {
        format!("{} seconds", self.processing_time)
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone, Copy)]
pub enum DaySpec {
    #[serde(rename = "MON")]
    Monday,
    #[serde(rename = "TUE")]
    Tuesday,
    #[serde(rename = "WED")]
    Wednesday,
    #[serde(rename = "THU")]
    Thursday,
    #[serde(rename = "FRI")]
    Friday,
    #[serde(rename = "SAT")]
    Saturday,
    #[serde(rename = "SUN")]
    Sunday,
    #[serde(rename = "ALL")]
    All,
}

impl DaySpec {
    pub fn matches(&self, day: Weekday) -> bool {
        match self {
            DaySpec::All => true,
            DaySpec::Monday => day == Weekday::Mon,
            DaySpec::Tuesday => day == Weekday::Tue,
            DaySpec::Wednesday => day == Weekday::Wed,
            DaySpec::Thursday => day == Weekday::Thu,
            DaySpec::Friday => day == Weekday::Fri,
            DaySpec::Saturday => day == Weekday::Sat,
            DaySpec::Sunday => day == Weekday::Sun,
        }
    }
}

/// A time-of-day slot during which a gateway accepts payments.
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
pub struct AvailabilityWindow {
    pub day: DaySpec,
    #[serde(default)]
    pub start_time: Option<NaiveTime>,
    #[serde(default)]
    pub end_time: Option<NaiveTime>,
    #[serde(default)]
    pub is_24x7: bool,
}

impl AvailabilityWindow {
    pub fn always() -> Self {
        Self {
            day: DaySpec::All,
            start_time: None,
            end_time: None,
            is_24x7: true,
        }
    }

    pub fn between(day: DaySpec, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            day,
            start_time: Some(start),
            end_time: Some(end),
            is_24x7: false,
        }
    }

    /// Both bounds are exclusive.
    pub fn is_open_at(&self, at: NaiveDateTime) -> bool {
        if !self.day.matches(at.weekday()) {
            return false;
        }
        if self.is_24x7 {
            return true;
        }
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => {
                let time = at.time();
                time > start && time < end
            }
            _ => false,
        }
    }
}
