use crate::application::reporting::QuotaReport;
use crate::error::Result;
use std::io::Write;

/// Writes a quota report as CSV, one row per gateway.
pub struct QuotaWriter<W: Write> {
    writer: csv::Writer<W>,
}

impl<W: Write> QuotaWriter<W> {
    pub fn new(sink: W) -> Self {
        Self {
            writer: csv::Writer::from_writer(sink),
        }
    }

    pub fn write_report(&mut self, report: &QuotaReport) -> Result<()> {
        for quota in &report.quotas {
            self.writer.serialize(quota)?;
        }
        self.writer.flush()?;
        Ok(())
    }
}
