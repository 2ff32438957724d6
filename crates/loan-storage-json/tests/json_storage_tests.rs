use chrono::NaiveDate;
use loan_core::{LedgerEngine, LoanStore, NewLoan, StoreError};
use loan_domain::{LoanKind, NotificationState};
use loan_storage_json::{JsonLoanStore, NotificationStateFile, StoragePaths};
use rust_decimal::Decimal;
use std::{
    fs,
    io::{self, Write},
    sync::{Arc, Mutex},
};
use tempfile::tempdir;
use uuid::Uuid;

fn day(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

fn draft(price: i64, description: &str, debtor: &str) -> loan_domain::LoanDraft {
    LedgerEngine::create_loan(NewLoan::new(
        Decimal::from(price),
        description,
        debtor,
        day(2024, 1, 10),
    ))
    .expect("valid loan")
}

#[test]
fn json_store_persists_created_loans() {
    let dir = tempdir().expect("tempdir");
    let store = JsonLoanStore::new(StoragePaths::under(dir.path())).expect("create store");

    let created = store.create(draft(100, "Shoes", "Ana")).expect("create loan");
    assert!(store.loans_path().exists());

    let reopened = JsonLoanStore::new(StoragePaths::under(dir.path())).expect("reopen store");
    let loaded = reopened.get(created.id()).expect("get loan");
    assert_eq!(loaded, created);
    assert_eq!(reopened.list().expect("list").len(), 1);
}

#[test]
fn json_store_updates_and_removes_loans() {
    let dir = tempdir().expect("tempdir");
    let store = JsonLoanStore::new(StoragePaths::under(dir.path())).expect("create store");
    let loan = store.create(draft(100, "Shoes", "Ana")).expect("create loan");

    let paid = LedgerEngine::add_payment(&loan, Decimal::from(100), day(2024, 2, 1))
        .expect("payment")
        .loan;
    store.update(loan.id(), &paid).expect("update loan");
    assert!(store.get(loan.id()).expect("get loan").is_paid());

    store.remove(loan.id()).expect("remove loan");
    assert!(matches!(store.get(loan.id()), Err(StoreError::NotFound(_))));
    assert!(matches!(
        store.remove(loan.id()),
        Err(StoreError::NotFound(_))
    ));
}

#[test]
fn json_store_rejects_update_of_unknown_loan() {
    let dir = tempdir().expect("tempdir");
    let store = JsonLoanStore::new(StoragePaths::under(dir.path())).expect("create store");
    let loan = loan_domain::Loan::from_draft(Uuid::new_v4(), draft(50, "Bag", "Bia"));

    assert!(matches!(
        store.update(loan.id(), &loan),
        Err(StoreError::NotFound(_))
    ));
    assert!(store.update(Uuid::new_v4(), &loan).is_err());
}

#[test]
fn json_store_backs_up_previous_file_and_prunes() {
    let dir = tempdir().expect("tempdir");
    let paths = StoragePaths::under(dir.path());
    let store = JsonLoanStore::with_retention(paths.clone(), 2).expect("create store");

    for index in 0..4 {
        store
            .create(draft(10 + index, "Item", "Ana"))
            .expect("create loan");
    }
    store.backup(Some("Before cleanup")).expect("labelled backup");

    let backups = store.list_backups().expect("list backups");
    assert!(!backups.is_empty());
    assert!(backups.len() <= 2);
    assert!(backups
        .iter()
        .all(|info| info.path.starts_with(&paths.backup_root)));
}

#[test]
fn json_store_restores_backup_contents() {
    let dir = tempdir().expect("tempdir");
    let store = JsonLoanStore::new(StoragePaths::under(dir.path())).expect("create store");
    let kept = store.create(draft(100, "Shoes", "Ana")).expect("create loan");

    let info = store.backup(None).expect("backup");
    store.remove(kept.id()).expect("remove loan");
    assert!(store.list().expect("list").is_empty());

    let restored = store.restore_backup(&info).expect("restore backup");
    assert_eq!(restored.len(), 1);
    assert_eq!(store.get(kept.id()).expect("get restored"), kept);
}

#[test]
fn json_store_migrates_legacy_records() {
    let dir = tempdir().expect("tempdir");
    let paths = StoragePaths::under(dir.path());
    fs::create_dir_all(&paths.data_root).expect("data dir");
    let id = Uuid::new_v4();
    let legacy = format!(
        r#"[{{
            "id": "{id}",
            "date": "2023-11-02",
            "description": "Empréstimo para Ana",
            "debtorName": "Ana",
            "salePrice": 200,
            "totalReceived": 50,
            "remaining": 150,
            "isPaid": false,
            "payments": []
        }}]"#
    );
    fs::write(paths.loans_file(), legacy).expect("write legacy file");

    let store = JsonLoanStore::new(paths).expect("create store");
    let loan = store.get(id).expect("legacy loan");

    assert_eq!(loan.payments().len(), 1);
    assert_eq!(loan.payments()[0].date, day(2023, 11, 2));
    assert_eq!(loan.total_received(), Decimal::from(50));
    assert_eq!(loan.remaining(), Decimal::from(150));
    assert!(!loan.is_paid());
    assert_eq!(loan.kind(), LoanKind::Loan);

    let rescheduled = loan.clone().with_due_date(Some(day(2024, 1, 31)));
    store.update(id, &rescheduled).expect("rewrite file");
    let reloaded = store.get(id).expect("reloaded loan");
    assert_eq!(reloaded.total_received(), Decimal::from(50));
    assert_eq!(reloaded.payments().len(), 1);
}

#[test]
fn json_store_reports_malformed_file() {
    let dir = tempdir().expect("tempdir");
    let paths = StoragePaths::under(dir.path());
    fs::create_dir_all(&paths.data_root).expect("data dir");
    fs::write(paths.loans_file(), "{ not json").expect("write file");

    let store = JsonLoanStore::new(paths).expect("create store");
    assert!(matches!(store.list(), Err(StoreError::Serde(_))));
}

#[test]
fn notification_state_round_trips_through_disk() {
    let dir = tempdir().expect("tempdir");
    let file = NotificationStateFile::in_paths(&StoragePaths::under(dir.path()));

    assert!(file.load().expect("load missing").is_empty());

    let id = Uuid::new_v4();
    let state = NotificationState::default().with_dismissed(id);
    file.save(&state).expect("save state");

    let loaded = file.load().expect("load state");
    assert!(loaded.is_dismissed(id));
    assert_eq!(loaded.len(), 1);
}

#[test]
fn quick_successive_writes_keep_every_backup() {
    let dir = tempdir().expect("tempdir");
    let store =
        JsonLoanStore::with_retention(StoragePaths::under(dir.path()), 10).expect("create store");

    for index in 0..4 {
        store
            .create(draft(10 + index, "Item", "Ana"))
            .expect("create loan");
    }

    // One backup per write after the first, none overwritten.
    assert_eq!(store.list_backups().expect("list backups").len(), 3);
}

#[test]
fn batch_update_writes_all_loans_or_none() {
    let dir = tempdir().expect("tempdir");
    let store = JsonLoanStore::new(StoragePaths::under(dir.path())).expect("create store");
    let first = store.create(draft(100, "Shoes", "Ana")).expect("first loan");
    let second = store.create(draft(40, "Belt", "Ana")).expect("second loan");

    let moved: Vec<_> = [first.clone(), second.clone()]
        .into_iter()
        .map(|loan| loan.with_debtor("Bia", None))
        .collect();
    let mut with_unknown = moved.clone();
    with_unknown.push(loan_domain::Loan::from_draft(Uuid::new_v4(), draft(5, "Pin", "Ana")));

    assert!(matches!(
        store.update_many(&with_unknown),
        Err(StoreError::NotFound(_))
    ));
    assert!(store
        .list()
        .expect("list")
        .iter()
        .all(|loan| loan.debtor_name() == "Ana"));

    let backups_before = store.list_backups().expect("backups").len();
    store.update_many(&moved).expect("batch update");
    assert!(store
        .list()
        .expect("list")
        .iter()
        .all(|loan| loan.debtor_name() == "Bia"));
    assert_eq!(store.list_backups().expect("backups").len(), backups_before + 1);
}

#[derive(Clone, Default)]
struct CapturedLog(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("log buffer").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

#[test]
fn reading_overpaid_loans_does_not_warn() {
    let dir = tempdir().expect("tempdir");
    let store = JsonLoanStore::new(StoragePaths::under(dir.path())).expect("create store");
    let loan = store.create(draft(100, "Shoes", "Ana")).expect("create loan");
    let overpaid = LedgerEngine::add_payment(&loan, Decimal::from(130), day(2024, 2, 1))
        .expect("payment")
        .loan;
    store.update(loan.id(), &overpaid).expect("store overpaid loan");

    let log = CapturedLog::default();
    let writer = log.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::WARN)
        .with_ansi(false)
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, || {
        for _ in 0..3 {
            store.list().expect("list");
            store.get(loan.id()).expect("get");
        }
    });

    let output = String::from_utf8(log.0.lock().expect("log buffer").clone()).expect("utf8");
    assert!(!output.contains("overpaid"), "unexpected warnings: {output}");
}
