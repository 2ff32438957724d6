#![doc(test(attr(deny(warnings))))]

//! Loan Ledger tracks credit sales owed by named debtors: payments against
//! each sale, per-debtor totals, and reminders for overdue balances.

pub mod errors;
pub mod service;
pub mod utils;

pub use loan_config as config;
pub use loan_core as engine;
pub use loan_domain as domain;
pub use loan_storage_json as storage;

pub use errors::{AppError, AppResult};
pub use service::{LedgerReport, LoanService, NotificationSession};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and logs the build this process runs.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        let build = utils::build_info::current();
        tracing::info!(
            version = build.version,
            git = build.git_hash,
            profile = build.profile,
            "Loan Ledger tracing initialized."
        );
    });
}
