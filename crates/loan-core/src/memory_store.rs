//! In-process [`LoanStore`] used by tests and embedders without a backend.

use std::sync::{Mutex, MutexGuard};

use loan_domain::{Loan, LoanDraft, LoanId};
use uuid::Uuid;

use crate::storage::{LoanStore, StoreError, StoreResult};

/// Keeps loans in insertion order behind a mutex.
#[derive(Debug, Default)]
pub struct InMemoryLoanStore {
    loans: Mutex<Vec<Loan>>,
}

impl InMemoryLoanStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with already-identified loans.
    pub fn with_loans(loans: Vec<Loan>) -> Self {
        Self {
            loans: Mutex::new(loans),
        }
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Vec<Loan>>> {
        self.loans
            .lock()
            .map_err(|_| StoreError::Storage("loan store lock poisoned".into()))
    }
}

impl LoanStore for InMemoryLoanStore {
    fn list(&self) -> StoreResult<Vec<Loan>> {
        Ok(self.lock()?.clone())
    }

    fn get(&self, id: LoanId) -> StoreResult<Loan> {
        self.lock()?
            .iter()
            .find(|loan| loan.id() == id)
            .cloned()
            .ok_or(StoreError::NotFound(id))
    }

    fn create(&self, draft: LoanDraft) -> StoreResult<Loan> {
        let loan = Loan::from_draft(Uuid::new_v4(), draft);
        self.lock()?.push(loan.clone());
        Ok(loan)
    }

    fn update(&self, id: LoanId, loan: &Loan) -> StoreResult<Loan> {
        if loan.id() != id {
            return Err(StoreError::Storage(format!(
                "loan id {} does not match update target {}",
                loan.id(),
                id
            )));
        }
        let mut loans = self.lock()?;
        let slot = loans
            .iter_mut()
            .find(|existing| existing.id() == id)
            .ok_or(StoreError::NotFound(id))?;
        *slot = loan.clone();
        Ok(loan.clone())
    }

    fn update_many(&self, updated: &[Loan]) -> StoreResult<Vec<Loan>> {
        let mut loans = self.lock()?;
        if let Some(missing) = updated
            .iter()
            .find(|loan| !loans.iter().any(|existing| existing.id() == loan.id()))
        {
            return Err(StoreError::NotFound(missing.id()));
        }
        for loan in updated {
            if let Some(slot) = loans.iter_mut().find(|existing| existing.id() == loan.id()) {
                *slot = loan.clone();
            }
        }
        Ok(updated.to_vec())
    }

    fn remove(&self, id: LoanId) -> StoreResult<()> {
        let mut loans = self.lock()?;
        let before = loans.len();
        loans.retain(|loan| loan.id() != id);
        if loans.len() == before {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}
