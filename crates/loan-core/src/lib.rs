//! loan-core
//!
//! Ledger engine, debtor grouping, and overdue monitoring for credit sales.
//! Depends on loan-domain. No CLI, no terminal I/O, no direct file access.

pub mod collation;
pub mod error;
pub mod grouping_service;
pub mod ledger_engine;
pub mod memory_store;
pub mod overdue_monitor;
pub mod storage;
pub mod time;

pub use error::{LedgerError, LedgerResult, OverpaymentWarning, ValidationError};
pub use grouping_service::*;
pub use ledger_engine::*;
pub use memory_store::InMemoryLoanStore;
pub use overdue_monitor::*;
pub use storage::{LoanStore, StoreError, StoreResult};
pub use time::{Clock, FixedClock, SystemClock};
