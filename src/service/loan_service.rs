use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{debug, info, warn};

use loan_config::{Config, OverpaymentPolicy};
use loan_core::{
    GroupingService, LedgerEngine, LedgerError, LoanStore, LoanTermsEdit, NewLoan,
    OverdueMonitor, OverpaymentWarning, PaymentOutcome, StoreError, TransferRequest,
};
use loan_domain::{
    DebtorGroup, Loan, LoanId, LoanSummary, NotificationState, OverdueNotification,
};
use loan_storage_json::{JsonLoanStore, StoragePaths};

use crate::errors::{AppError, AppResult};

/// Point-in-time view of the whole ledger, suitable for export.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerReport {
    pub generated_on: NaiveDate,
    pub summary: LoanSummary,
    pub groups: Vec<DebtorGroup>,
    pub overdue: Vec<OverdueNotification>,
}

/// Runs ledger operations against a store: load, apply the engine, persist.
pub struct LoanService<S: LoanStore> {
    store: S,
    policy: OverpaymentPolicy,
}

impl LoanService<JsonLoanStore> {
    /// Opens the JSON store under the configured data root.
    pub fn open(config: &Config) -> AppResult<Self> {
        let paths = StoragePaths::under(config.resolve_data_root());
        let store = JsonLoanStore::with_retention(paths, config.backup_retention)?;
        info!(path = %store.loans_path().display(), "opened loan store");
        Ok(Self::from_config(store, config))
    }
}

impl<S: LoanStore> LoanService<S> {
    pub fn new(store: S, policy: OverpaymentPolicy) -> Self {
        Self { store, policy }
    }

    pub fn from_config(store: S, config: &Config) -> Self {
        Self::new(store, config.overpayment_policy)
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn policy(&self) -> OverpaymentPolicy {
        self.policy
    }

    pub fn loans(&self) -> AppResult<Vec<Loan>> {
        Ok(self.store.list()?)
    }

    pub fn loan(&self, id: LoanId) -> AppResult<Loan> {
        self.store.get(id).map_err(|err| match err {
            StoreError::NotFound(id) => AppError::Ledger(LedgerError::LoanNotFound(id)),
            other => AppError::Store(other),
        })
    }

    pub fn create_loan(&self, request: NewLoan) -> AppResult<Loan> {
        let draft = LedgerEngine::create_loan(request)?;
        if let Some(excess) = draft.balance().excess() {
            match self.policy {
                OverpaymentPolicy::Reject => {
                    return Err(AppError::OverpaymentRejected { excess });
                }
                OverpaymentPolicy::Warn => {
                    warn!(%excess, "initial payment exceeds sale price");
                }
            }
        }
        let loan = self.store.create(draft)?;
        info!(
            loan = %loan.id(),
            debtor = loan.debtor_key(),
            price = %loan.sale_price(),
            "created loan"
        );
        Ok(loan)
    }

    pub fn add_payment(
        &self,
        id: LoanId,
        amount: Decimal,
        date: NaiveDate,
    ) -> AppResult<PaymentOutcome> {
        let loan = self.loan(id)?;
        let outcome = self.check_overpayment(LedgerEngine::add_payment(&loan, amount, date)?)?;
        debug!(loan = %id, %amount, %date, "added payment");
        self.persist_outcome(outcome)
    }

    pub fn edit_payment(
        &self,
        id: LoanId,
        index: usize,
        amount: Decimal,
    ) -> AppResult<PaymentOutcome> {
        let loan = self.loan(id)?;
        let outcome = self.check_overpayment(LedgerEngine::edit_payment(&loan, index, amount)?)?;
        debug!(loan = %id, index, %amount, "edited payment");
        self.persist_outcome(outcome)
    }

    pub fn delete_payment(&self, id: LoanId, index: usize) -> AppResult<Loan> {
        let loan = self.loan(id)?;
        let updated = LedgerEngine::delete_payment(&loan, index)?;
        debug!(loan = %id, index, "deleted payment");
        Ok(self.store.update(id, &updated)?)
    }

    /// Moves loans to another debtor and returns the loans that changed.
    ///
    /// The moved loans are stored in one batch, so a failed write leaves every
    /// selected loan with the source debtor and the request can be retried.
    pub fn transfer_loans(&self, request: &TransferRequest) -> AppResult<Vec<Loan>> {
        let loans = self.store.list()?;
        let updated = LedgerEngine::transfer_loans(&loans, request)?;
        let persisted = self.store.update_many(&updated)?;
        info!(
            from = request.source_debtor.as_str(),
            to = request.target_debtor.trim(),
            count = persisted.len(),
            "transferred loans"
        );
        Ok(persisted)
    }

    pub fn delete_loan(&self, id: LoanId) -> AppResult<()> {
        let loans = self.store.list()?;
        LedgerEngine::delete_loan(&loans, id)?;
        self.store.remove(id)?;
        info!(loan = %id, "deleted loan");
        Ok(())
    }

    pub fn reschedule(&self, id: LoanId, due_date: Option<NaiveDate>) -> AppResult<Loan> {
        let loan = self.loan(id)?;
        let updated = LedgerEngine::reschedule(&loan, due_date);
        debug!(loan = %id, due = ?due_date, "rescheduled loan");
        Ok(self.store.update(id, &updated)?)
    }

    /// Lowering the price below what was already received follows the
    /// overpayment policy.
    pub fn revise_terms(&self, id: LoanId, edit: &LoanTermsEdit) -> AppResult<Loan> {
        let loan = self.loan(id)?;
        let revised = LedgerEngine::revise_terms(&loan, edit)?;
        let revised = self.check_overpayment(PaymentOutcome::from(revised))?.loan;
        info!(loan = %id, "revised loan terms");
        Ok(self.store.update(id, &revised)?)
    }

    pub fn groups(&self) -> AppResult<Vec<DebtorGroup>> {
        Ok(GroupingService::group_by_debtor(&self.store.list()?))
    }

    pub fn summary(&self) -> AppResult<LoanSummary> {
        Ok(GroupingService::compute_summary(&self.store.list()?))
    }

    pub fn search(&self, query: &str) -> AppResult<Vec<DebtorGroup>> {
        let groups = self.groups()?;
        Ok(GroupingService::search(&groups, query)
            .into_iter()
            .cloned()
            .collect())
    }

    pub fn report(&self, state: &NotificationState, today: NaiveDate) -> AppResult<LedgerReport> {
        let loans = self.store.list()?;
        Ok(LedgerReport {
            generated_on: today,
            summary: GroupingService::compute_summary(&loans),
            groups: GroupingService::group_by_debtor(&loans),
            overdue: OverdueMonitor::sorted_by_urgency(OverdueMonitor::active_notifications(
                &loans, state, today,
            )),
        })
    }

    /// Writes [`LoanService::report`] as pretty JSON.
    pub fn export_report(
        &self,
        state: &NotificationState,
        today: NaiveDate,
        path: &Path,
    ) -> AppResult<()> {
        let report = self.report(state, today)?;
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(path, json).map_err(StoreError::from)?;
        info!(path = %path.display(), "exported ledger report");
        Ok(())
    }

    fn check_overpayment(&self, outcome: PaymentOutcome) -> AppResult<PaymentOutcome> {
        if let Some(OverpaymentWarning { loan_id, excess }) = outcome.warning {
            match self.policy {
                OverpaymentPolicy::Reject => {
                    warn!(loan = %loan_id, %excess, "rejected overpayment");
                    return Err(AppError::OverpaymentRejected { excess });
                }
                OverpaymentPolicy::Warn => warn!(loan = %loan_id, %excess, "loan overpaid"),
            }
        }
        Ok(outcome)
    }

    fn persist_outcome(&self, outcome: PaymentOutcome) -> AppResult<PaymentOutcome> {
        let loan = self.store.update(outcome.loan.id(), &outcome.loan)?;
        Ok(PaymentOutcome {
            loan,
            warning: outcome.warning,
        })
    }
}
