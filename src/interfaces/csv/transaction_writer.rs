use crate::application::recorder::TransactionRecord;
use crate::error::Result;
use rust_decimal::Decimal;
use serde::Serialize;
use std::io::Write;

#[derive(Serialize)]
struct TransactionRow<'a> {
    transaction: &'a str,
    biller: &'a str,
    gateway: &'a str,
    amount: Decimal,
    commission: Decimal,
    urgency: &'a str,
    status: &'a str,
    remaining_quota: Decimal,
    created_at: String,
}

/// Writes committed transactions as CSV, one row per record.
pub struct TransactionWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> TransactionWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write(&mut self, record: &TransactionRecord) -> Result<()> {
        let tx = &record.transaction;
        self.writer.serialize(TransactionRow {
            transaction: &tx.code,
            biller: &record.biller_code,
            gateway: &record.gateway_code,
            amount: tx.amount.value(),
            commission: tx.commission,
            urgency: tx.urgency.as_str(),
            status: tx.status.as_str(),
            remaining_quota: record.remaining_quota(),
            created_at: tx.created_at.format("%Y-%m-%dT%H:%M:%S").to_string(),
        })?;
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gateway::Urgency;
    use crate::domain::money::Amount;
    use crate::domain::quota::{DailyQuota, QuotaKey};
    use crate::domain::transaction::{Transaction, TransactionStatus};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn record() -> TransactionRecord {
        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let created_at = day.and_hms_opt(12, 30, 5).unwrap();
        let amount = Amount::new(dec!(1000)).unwrap();
        let mut quota = DailyQuota::new(QuotaKey::new(1, 3, day), dec!(50000));
        quota.apply(amount);

        TransactionRecord {
            transaction: Transaction {
                code: "TXN-0001".to_string(),
                biller_id: 1,
                gateway_id: 3,
                amount,
                commission: dec!(17.00),
                urgency: Urgency::Instant,
                status: TransactionStatus::Completed,
                processing_time: "0 seconds".to_string(),
                created_at,
                completed_at: Some(created_at),
            },
            biller_code: "BILL_1".to_string(),
            gateway_code: "FAWRY".to_string(),
            gateway_name: "Fawry".to_string(),
            quota,
        }
    }

    #[test]
    fn test_transaction_writer_output() {
        let mut buffer = Vec::new();
        {
            let mut writer = TransactionWriter::new(&mut buffer);
            writer.write(&record()).unwrap();
            writer.flush().unwrap();
        }
        let output = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert_eq!(
            lines[0],
            "transaction,biller,gateway,amount,commission,urgency,status,remaining_quota,created_at"
        );
        assert_eq!(
            lines[1],
            "TXN-0001,BILL_1,FAWRY,1000,17.00,INSTANT,COMPLETED,49000,2024-01-01T12:30:05"
        );
        assert_eq!(lines.len(), 2);
    }
}
