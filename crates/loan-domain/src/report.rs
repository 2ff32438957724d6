//! Aggregated views over loan collections.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{common::LoanId, loan::Loan};

/// Loans owed by one debtor, with their combined figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DebtorGroup {
    pub debtor_name: String,
    pub loans: Vec<Loan>,
    pub total_sale_price: Decimal,
    pub total_received: Decimal,
    pub total_remaining: Decimal,
    pub all_paid: bool,
}

impl DebtorGroup {
    pub fn loan_ids(&self) -> impl Iterator<Item = LoanId> + '_ {
        self.loans.iter().map(Loan::id)
    }

    pub fn contains(&self, loan_id: LoanId) -> bool {
        self.loans.iter().any(|loan| loan.id() == loan_id)
    }
}

/// Totals across an entire loan collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanSummary {
    pub total_sales: Decimal,
    pub total_received: Decimal,
    pub total_remaining: Decimal,
    pub paid_count: usize,
    pub total_count: usize,
}

/// An unpaid loan whose due date has passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverdueNotification {
    pub loan_id: LoanId,
    pub debtor_name: String,
    pub description: String,
    pub due_date: NaiveDate,
    pub remaining: Decimal,
    pub days_overdue: i64,
}
