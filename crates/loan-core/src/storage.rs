use std::{io, path::PathBuf};

use loan_domain::{Loan, LoanDraft, LoanId};
use thiserror::Error;

/// Failures reported by a [`LoanStore`] backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Loan not found: {0}")]
    NotFound(LoanId),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Serialization error: {0}")]
    Serde(String),
    #[error("Storage error: {0}")]
    Storage(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Describes a persisted backup artifact for a loan collection.
#[derive(Debug, Clone)]
pub struct LoanBackupInfo {
    pub id: String,
    pub created_at: String,
    pub path: PathBuf,
}

/// Persistence contract consumed by the ledger: list/get/create/update/remove.
pub trait LoanStore: Send + Sync {
    /// Returns every stored loan in insertion order.
    fn list(&self) -> StoreResult<Vec<Loan>>;
    fn get(&self, id: LoanId) -> StoreResult<Loan>;
    /// Persists a draft and assigns its identifier.
    fn create(&self, draft: LoanDraft) -> StoreResult<Loan>;
    fn update(&self, id: LoanId, loan: &Loan) -> StoreResult<Loan>;
    /// Replaces several loans at once: either all are stored or none are.
    fn update_many(&self, loans: &[Loan]) -> StoreResult<Vec<Loan>>;
    fn remove(&self, id: LoanId) -> StoreResult<()>;
}

/// Detects stored loans whose figures warrant attention.
pub fn loan_warnings(loans: &[Loan]) -> Vec<String> {
    let mut warnings = Vec::new();
    for loan in loans {
        if let Some(excess) = loan.balance().excess() {
            warnings.push(format!(
                "loan {} is overpaid by {}",
                loan.id(),
                excess
            ));
        }
        if let Some(due) = loan.due_date() {
            if due < loan.date() {
                warnings.push(format!(
                    "loan {} is due {} before its origination {}",
                    loan.id(),
                    due,
                    loan.date()
                ));
            }
        }
    }
    warnings
}
