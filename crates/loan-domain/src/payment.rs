//! Payment entries and the balance derived from them.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::common::Amounted;

/// One recorded partial payment applied against a loan's sale price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub date: NaiveDate,
    pub amount: Decimal,
}

impl Payment {
    pub fn new(date: NaiveDate, amount: Decimal) -> Self {
        Self { date, amount }
    }
}

impl Amounted for Payment {
    fn amount(&self) -> Decimal {
        self.amount
    }
}

/// Figures derived from a sale price and its payments.
///
/// Always produced by [`LoanBalance::compute`]; never patched incrementally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanBalance {
    pub total_received: Decimal,
    pub remaining: Decimal,
    pub is_paid: bool,
}

impl LoanBalance {
    /// Recomputes the balance from scratch.
    pub fn compute(sale_price: Decimal, payments: &[Payment]) -> Self {
        let total_received: Decimal = payments.iter().map(Amounted::amount).sum();
        let remaining = sale_price - total_received;
        Self {
            total_received,
            remaining,
            is_paid: remaining <= Decimal::ZERO,
        }
    }

    /// Returns `true` when more was received than the sale price.
    pub fn is_overpaid(&self) -> bool {
        self.remaining < Decimal::ZERO
    }

    /// Amount received beyond the sale price, if any.
    pub fn excess(&self) -> Option<Decimal> {
        self.is_overpaid().then(|| -self.remaining)
    }
}
