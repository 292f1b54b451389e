use crate::domain::biller::Biller;
use crate::domain::gateway::{AvailabilityWindow, Gateway};
use crate::error::{Result, RoutingError};
use crate::infrastructure::in_memory::InMemoryCatalog;
use serde::Deserialize;
use std::collections::HashSet;
use std::io::Read;

#[derive(Debug, Deserialize)]
pub struct GatewayEntry {
    #[serde(flatten)]
    pub gateway: Gateway,
    #[serde(default)]
    pub availability: Vec<AvailabilityWindow>,
}

/// The JSON catalog document: billers plus gateways with their availability windows.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    #[serde(default)]
    pub billers: Vec<Biller>,
    #[serde(default)]
    pub gateways: Vec<GatewayEntry>,
}

impl CatalogFile {
    pub fn from_reader<R: Read>(source: R) -> Result<Self> {
        serde_json::from_reader(source)
            .map_err(|e| RoutingError::CatalogError(format!("invalid catalog document: {}", e)))
    }

    /// Rejects gateways breaking their invariants and duplicated ids or codes.
    pub fn validate(&self) -> Result<()> {
        let mut gateway_ids = HashSet::new();
        let mut gateway_codes = HashSet::new();
        for entry in &self.gateways {
            entry.gateway.validate()?;
            if !gateway_ids.insert(entry.gateway.id) {
                return Err(RoutingError::CatalogError(format!(
                    "duplicate gateway id {}",
                    entry.gateway.id
                )));
            }
            if !gateway_codes.insert(entry.gateway.code.as_str()) {
                return Err(RoutingError::CatalogError(format!(
                    "duplicate gateway code {}",
                    entry.gateway.code
                )));
            }
        }

        let mut biller_codes = HashSet::new();
        for biller in &self.billers {
            if !biller_codes.insert(biller.code.as_str()) {
                return Err(RoutingError::CatalogError(format!(
                    "duplicate biller code {}",
                    biller.code
                )));
            }
        }
        Ok(())
    }

    pub async fn into_catalog(self) -> Result<InMemoryCatalog> {
        self.validate()?;
        let catalog = InMemoryCatalog::new();
        for entry in self.gateways {
            catalog.upsert_gateway(entry.gateway, entry.availability).await;
        }
        for biller in self.billers {
            catalog.upsert_biller(biller).await;
        }
        Ok(catalog)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::gateway::DaySpec;
    use crate::domain::ports::{BillerStore, CatalogStore};
    use rust_decimal_macros::dec;

    const CATALOG: &str = r#"{
        "billers": [{ "id": 1, "code": "BILL_1", "name": "Water", "email": "ops@water.test" }],
        "gateways": [
            {
                "id": 10, "code": "FAWRY", "name": "Fawry",
                "commission_fixed": "2.00", "commission_percentage": "0.015",
                "min_transaction": "10", "max_transaction": "5000",
                "daily_limit": "50000", "processing_time": 0,
                "availability": [{ "day": "ALL", "is_24x7": true }]
            },
            {
                "id": 11, "code": "BANK", "name": "Bank Transfer",
                "commission_fixed": "0", "commission_percentage": "0.001",
                "daily_limit": "1000000", "processing_time": 86400, "active": false,
                "availability": [{ "day": "MON", "start_time": "08:00:00", "end_time": "20:00:00" }]
            }
        ]
    }"#;

    #[tokio::test]
    async fn test_catalog_file_loads() {
        let catalog = CatalogFile::from_reader(CATALOG.as_bytes())
            .unwrap()
            .into_catalog()
            .await
            .unwrap();

        let active = catalog.active_gateways().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].commission_percentage, dec!(0.015));

        let bank = catalog.find_gateway_by_code("BANK").await.unwrap().unwrap();
        assert_eq!(bank.max_transaction, dec!(0));
        let windows = catalog.availability_windows(11).await.unwrap();
        assert_eq!(windows[0].day, DaySpec::Monday);
        assert!(!windows[0].is_24x7);

        assert!(catalog.find_biller_by_code("BILL_1").await.unwrap().is_some());
    }

    #[test]
    fn test_catalog_file_rejects_duplicates() {
        let doc = r#"{ "gateways": [
            { "id": 1, "code": "A", "name": "A", "daily_limit": "10" },
            { "id": 2, "code": "A", "name": "A again", "daily_limit": "10" }
        ] }"#;
        let file = CatalogFile::from_reader(doc.as_bytes()).unwrap();
        assert!(matches!(file.validate(), Err(RoutingError::CatalogError(_))));
    }

    #[test]
    fn test_catalog_file_rejects_invalid_gateway() {
        let doc = r#"{ "gateways": [
            { "id": 1, "code": "A", "name": "A", "daily_limit": "0" }
        ] }"#;
        let file = CatalogFile::from_reader(doc.as_bytes()).unwrap();
        assert!(file.validate().is_err());
    }

    #[test]
    fn test_catalog_file_rejects_malformed_json() {
        assert!(matches!(
            CatalogFile::from_reader("{ not json".as_bytes()),
            Err(RoutingError::CatalogError(_))
        ));
    }
}
