pub mod loan_service;
pub mod notification_session;

pub use loan_service::{LedgerReport, LoanService};
pub use notification_session::NotificationSession;
