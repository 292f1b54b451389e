use crate::application::recorder::ChargeRequest;
use crate::application::router::PaymentRequest;
use crate::domain::gateway::Urgency;
use crate::domain::money::Amount;
use crate::error::{Result, RoutingError};
use serde::Deserialize;
use std::io::Read;

#[derive(Debug, Deserialize)]
struct RequestRow {
    biller: String,
    amount: Amount,
    urgency: Urgency,
    #[serde(default)]
    gateway: Option<String>,
}

/// One line of the request file.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestLine {
    /// No gateway given: route, then charge the winner.
    Recommend(PaymentRequest),
    /// Charge the named gateway directly.
    Charge(ChargeRequest),
}

impl From<RequestRow> for RequestLine {
    fn from(row: RequestRow) -> Self {
        match row.gateway.filter(|g| !g.is_empty()) {
            Some(gateway_code) => RequestLine::Charge(ChargeRequest {
                biller_code: row.biller,
                gateway_code,
                amount: row.amount,
                urgency: row.urgency,
            }),
            None => RequestLine::Recommend(PaymentRequest {
                biller_code: row.biller,
                amount: row.amount,
                urgency: row.urgency,
            }),
        }
    }
}

/// Reads payment requests from a CSV source with columns `biller, amount, urgency[, gateway]`.
///
/// Whitespace is trimmed and the `gateway` column may be absent altogether.
pub struct RequestReader<R: Read> {
    reader: csv::Reader<R>,
}

impl<R: Read> RequestReader<R> {
    pub fn new(source: R) -> Self {
        let reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(source);
        Self { reader }
    }

    /// Lazily deserializes requests, one `Result` per row.
    pub fn requests(self) -> impl Iterator<Item = Result<RequestLine>> {
        self.reader
            .into_deserialize::<RequestRow>()
            .map(|result| result.map(RequestLine::from).map_err(RoutingError::from))
    }
}
