#![allow(dead_code)]

use std::{path::PathBuf, sync::Mutex};

use chrono::NaiveDate;
use loan_ledger::{
    config::{Config, OverpaymentPolicy},
    storage::{JsonLoanStore, NotificationStateFile, StoragePaths},
    LoanService,
};
use once_cell::sync::Lazy;
use tempfile::TempDir;

/// Holds TempDir guards so temporary folders live for the duration of the test run.
static TEST_DIRS: Lazy<Mutex<Vec<TempDir>>> = Lazy::new(|| Mutex::new(Vec::new()));

pub fn temp_root() -> PathBuf {
    let temp = TempDir::new().expect("create temp dir");
    let base = temp.path().to_path_buf();
    TEST_DIRS.lock().expect("lock temp dir registry").push(temp);
    base
}

/// Config pointing at a fresh data directory.
pub fn test_config(policy: OverpaymentPolicy) -> Config {
    Config {
        overpayment_policy: policy,
        data_root: Some(temp_root().join("data")),
        ..Config::default()
    }
}

/// JSON-backed service in an isolated directory.
pub fn setup_service(policy: OverpaymentPolicy) -> (LoanService<JsonLoanStore>, Config) {
    let config = test_config(policy);
    let service = LoanService::open(&config).expect("open loan service");
    (service, config)
}

pub fn notification_file(config: &Config) -> NotificationStateFile {
    NotificationStateFile::in_paths(&StoragePaths::under(config.resolve_data_root()))
}

pub fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}
