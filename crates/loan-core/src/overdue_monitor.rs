//! Overdue detection and notification dismissal.
//!
//! Stateless: the dismissed set arrives as a [`NotificationState`] value and
//! comes back updated from [`OverdueMonitor::dismiss`].

use chrono::NaiveDate;

use loan_domain::{Loan, LoanId, LoanStatus, NotificationState, OverdueNotification};

pub struct OverdueMonitor;

impl OverdueMonitor {
    /// An unpaid loan is overdue once its due date is strictly before `today`.
    pub fn is_overdue(loan: &Loan, today: NaiveDate) -> bool {
        !loan.is_paid() && loan.due_date().is_some_and(|due| due < today)
    }

    /// Derives the loan's lifecycle state; never stored.
    pub fn status(loan: &Loan, today: NaiveDate) -> LoanStatus {
        if loan.is_paid() {
            LoanStatus::Paid
        } else if Self::is_overdue(loan, today) {
            LoanStatus::Overdue
        } else {
            LoanStatus::Pending
        }
    }

    /// Overdue loans that have not been dismissed, in input order.
    pub fn active_notifications(
        loans: &[Loan],
        state: &NotificationState,
        today: NaiveDate,
    ) -> Vec<OverdueNotification> {
        loans
            .iter()
            .filter(|loan| !state.is_dismissed(loan.id()))
            .filter_map(|loan| Self::notification_for(loan, today))
            .collect()
    }

    /// Orders notifications by due date, oldest first.
    pub fn sorted_by_urgency(mut notifications: Vec<OverdueNotification>) -> Vec<OverdueNotification> {
        notifications.sort_by_key(|notification| notification.due_date);
        notifications
    }

    /// Returns `state` with `loan_id` dismissed.
    pub fn dismiss(loan_id: LoanId, state: NotificationState) -> NotificationState {
        state.with_dismissed(loan_id)
    }

    fn notification_for(loan: &Loan, today: NaiveDate) -> Option<OverdueNotification> {
        if !Self::is_overdue(loan, today) {
            return None;
        }
        let due_date = loan.due_date()?;
        Some(OverdueNotification {
            loan_id: loan.id(),
            debtor_name: loan.debtor_key().to_string(),
            description: loan.description().to_string(),
            due_date,
            remaining: loan.remaining(),
            days_overdue: (today - due_date).num_days(),
        })
    }
}
