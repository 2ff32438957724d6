//! loan-domain
//!
//! Pure domain models (Loan, Payment, balances, reports, notification state).
//! No I/O, no CLI, no storage. Only data types and core enums.

pub mod common;
pub mod loan;
pub mod notification;
pub mod payment;
pub mod record;
pub mod report;

pub use common::*;
pub use loan::*;
pub use notification::*;
pub use payment::*;
pub use record::*;
pub use report::*;
