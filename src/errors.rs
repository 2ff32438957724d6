use loan_config::ConfigError;
use loan_core::{LedgerError, StoreError};
use rust_decimal::Decimal;
use thiserror::Error;

/// Failures surfaced by [`crate::LoanService`] and [`crate::NotificationSession`].
#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("Payment rejected: received amount would exceed the sale price by {excess}")]
    OverpaymentRejected { excess: Decimal },
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
}

impl AppError {
    pub fn is_validation(&self) -> bool {
        matches!(self, AppError::Ledger(err) if err.is_validation())
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            AppError::Ledger(err) => err.is_not_found(),
            AppError::Store(StoreError::NotFound(_)) => true,
            _ => false,
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
