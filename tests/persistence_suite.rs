mod common;

use common::{day, setup_service, temp_root};
use loan_ledger::{
    config::{ConfigManager, OverpaymentPolicy},
    domain::NotificationState,
    engine::NewLoan,
    LoanService,
};
use rust_decimal::Decimal;
use std::fs;

#[test]
fn reopened_service_sees_persisted_loans() {
    let (service, config) = setup_service(OverpaymentPolicy::Warn);
    let loan = service
        .create_loan(NewLoan::new(Decimal::from(75), "Lamp", "Eva", day(2024, 5, 1)))
        .expect("create loan");
    drop(service);

    let reopened = LoanService::open(&config).expect("reopen");
    assert_eq!(reopened.loan(loan.id()).expect("reload"), loan);
}

#[test]
fn config_round_trip_drives_service_policy() {
    let root = temp_root();
    let manager = ConfigManager::with_base_dir(root.clone()).expect("config manager");
    let mut config = manager.load().expect("defaults");
    config.overpayment_policy = OverpaymentPolicy::Reject;
    config.data_root = Some(root.join("data"));
    manager.save(&config).expect("save config");

    let loaded = manager.load().expect("load config");
    let service = LoanService::open(&loaded).expect("open");
    assert_eq!(service.policy(), OverpaymentPolicy::Reject);
    assert!(service.store().loans_path().starts_with(root.join("data")));
}

#[test]
fn report_export_writes_summary_and_overdue() {
    let (service, _config) = setup_service(OverpaymentPolicy::Warn);
    service
        .create_loan(
            NewLoan::new(Decimal::from(100), "Lamp", "Eva", day(2024, 5, 1))
                .with_due_date(day(2024, 5, 10)),
        )
        .expect("create loan");
    let path = temp_root().join("report.json");

    service
        .export_report(&NotificationState::default(), day(2024, 6, 1), &path)
        .expect("export report");

    let json: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&path).expect("read report")).expect("parse");
    assert_eq!(json["generatedOn"], "2024-06-01");
    assert_eq!(json["summary"]["totalCount"], 1);
    assert_eq!(json["groups"][0]["debtorName"], "Eva");
    assert_eq!(json["overdue"][0]["daysOverdue"], 22);
}
