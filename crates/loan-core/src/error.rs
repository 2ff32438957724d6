use loan_domain::LoanId;
use rust_decimal::Decimal;
use thiserror::Error;

/// Failures returned by the ledger engine. The input loan is never modified.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
    #[error("Loan not found: {0}")]
    LoanNotFound(LoanId),
    #[error("Payment {index} not found on loan {loan_id} ({len} recorded)")]
    PaymentNotFound {
        loan_id: LoanId,
        index: usize,
        len: usize,
    },
}

impl LedgerError {
    /// The input violated a precondition; re-prompt the user.
    pub fn is_validation(&self) -> bool {
        matches!(self, LedgerError::Validation(_))
    }

    /// The caller's snapshot is stale; reload and retry.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            LedgerError::LoanNotFound(_) | LedgerError::PaymentNotFound { .. }
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("sale price must be greater than zero")]
    NonPositiveSalePrice,
    #[error("description must not be empty")]
    EmptyDescription,
    #[error("payment amount must be greater than zero")]
    NonPositiveAmount,
    #[error("transfer target debtor must not be blank")]
    BlankTarget,
    #[error("cannot transfer loans from `{0}` to the same debtor")]
    SelfTransfer(String),
    #[error("no loans selected for transfer")]
    EmptySelection,
    #[error("loan {loan_id} is not owned by `{source_debtor}`")]
    NotOwnedBySource {
        loan_id: LoanId,
        source_debtor: String,
    },
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Advisory attached to a successful payment mutation that left the loan
/// with a negative remaining balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverpaymentWarning {
    pub loan_id: LoanId,
    pub excess: Decimal,
}
