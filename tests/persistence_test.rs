#![cfg(feature = "storage-rocksdb")]

use assert_cmd::cargo_bin;
use std::io::Write;
use std::process::Command;
use tempfile::tempdir;

const CATALOG: &str = "tests/fixtures/catalog.json";
const MONDAY_NOON: &str = "2024-01-01T12:00:00";

fn route(db_path: &std::path::Path, rows: &[&str]) -> String {
    let mut csv = tempfile::NamedTempFile::new().unwrap();
    writeln!(csv, "biller,amount,urgency,gateway").unwrap();
    for row in rows {
        writeln!(csv, "{}", row).unwrap();
    }

    let output = Command::new(cargo_bin!("payrouter"))
        .arg("--catalog")
        .arg(CATALOG)
        .arg("--db-path")
        .arg(db_path)
        .arg("--at")
        .arg(MONDAY_NOON)
        .arg("route")
        .arg(csv.path())
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    String::from_utf8_lossy(&output.stdout).into_owned()
}

#[test]
fn test_quota_usage_survives_restart() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");

    // 1. First run: charge 1500 of VODAFONE's 2000 limit
    let stdout1 = route(&db_path, &["BILL_1,1500,INSTANT,VODAFONE"]);
    assert!(stdout1.contains(",BILL_1,VODAFONE,1500,31.00,INSTANT,COMPLETED,500,"));

    // 2. Second run: the recovered quota leaves 500, so 100 more fits
    let stdout2 = route(&db_path, &["BILL_1,100,INSTANT,VODAFONE"]);
    assert!(stdout2.contains(",BILL_1,VODAFONE,100,3.00,INSTANT,COMPLETED,400,"));

    // 3. Third run: 600 no longer fits
    let stdout3 = route(&db_path, &["BILL_1,600,INSTANT,VODAFONE"]);
    assert!(!stdout3.contains("VODAFONE"));

    let output = Command::new(cargo_bin!("payrouter"))
        .arg("--catalog")
        .arg(CATALOG)
        .arg("--db-path")
        .arg(&db_path)
        .arg("--at")
        .arg(MONDAY_NOON)
        .arg("quotas")
        .arg("BILL_1")
        .output()
        .expect("Failed to execute command");
    assert!(output.status.success());
    let report = String::from_utf8_lossy(&output.stdout);
    assert!(report.contains("VODAFONE,Vodafone Cash,2000,1600,400,2,"));
}
