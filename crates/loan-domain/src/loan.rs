//! Domain models for credit-sale loans.

use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{
    common::*,
    payment::{LoanBalance, Payment},
    record::LoanRecord,
};

/// A credit-sale record tracking an amount owed by a named debtor.
///
/// Derived figures (`total_received`, `remaining`, `is_paid`) are private and
/// only ever written by [`LoanBalance::compute`]. Every method that touches the
/// sale price or payments returns a freshly recomputed value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "LoanRecord")]
pub struct Loan {
    id: LoanId,
    date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    due_date: Option<NaiveDate>,
    description: String,
    debtor_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    debtor_phone: Option<String>,
    sale_price: Decimal,
    total_received: Decimal,
    remaining: Decimal,
    is_paid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    linked_product_id: Option<String>,
    payments: Vec<Payment>,
    kind: LoanKind,
}

impl Loan {
    /// Materializes a draft under the identifier assigned by a store.
    pub fn from_draft(id: LoanId, draft: LoanDraft) -> Self {
        let balance = draft.balance();
        Self {
            id,
            date: draft.date,
            due_date: draft.due_date,
            description: draft.description,
            debtor_name: draft.debtor_name,
            debtor_phone: draft.debtor_phone,
            sale_price: draft.sale_price,
            total_received: balance.total_received,
            remaining: balance.remaining,
            is_paid: balance.is_paid,
            linked_product_id: draft.linked_product_id,
            payments: draft.payments,
            kind: draft.kind,
        }
    }

    pub fn id(&self) -> LoanId {
        self.id
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Debtor name exactly as recorded (possibly blank).
    pub fn debtor_name(&self) -> &str {
        &self.debtor_name
    }

    /// Debtor name normalized for grouping and ownership checks.
    pub fn debtor_key(&self) -> &str {
        debtor_key(&self.debtor_name)
    }

    pub fn debtor_phone(&self) -> Option<&str> {
        self.debtor_phone.as_deref()
    }

    pub fn sale_price(&self) -> Decimal {
        self.sale_price
    }

    pub fn payments(&self) -> &[Payment] {
        &self.payments
    }

    pub fn total_received(&self) -> Decimal {
        self.total_received
    }

    pub fn remaining(&self) -> Decimal {
        self.remaining
    }

    pub fn is_paid(&self) -> bool {
        self.is_paid
    }

    pub fn balance(&self) -> LoanBalance {
        LoanBalance {
            total_received: self.total_received,
            remaining: self.remaining,
            is_paid: self.is_paid,
        }
    }

    pub fn linked_product_id(&self) -> Option<&str> {
        self.linked_product_id.as_deref()
    }

    pub fn kind(&self) -> LoanKind {
        self.kind
    }

    /// Replaces the payment list and recomputes the balance.
    pub fn with_payments(mut self, payments: Vec<Payment>) -> Self {
        self.payments = payments;
        self.recompute();
        self
    }

    /// Replaces the sale price and recomputes the balance.
    pub fn with_sale_price(mut self, sale_price: Decimal) -> Self {
        self.sale_price = sale_price;
        self.recompute();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = due_date;
        self
    }

    pub fn with_linked_product(mut self, linked_product_id: Option<String>) -> Self {
        self.linked_product_id = linked_product_id;
        self
    }

    /// Reassigns the debtor identity. Financial figures are untouched.
    pub fn with_debtor(mut self, debtor_name: impl Into<String>, debtor_phone: Option<String>) -> Self {
        self.debtor_name = debtor_name.into();
        self.debtor_phone = debtor_phone;
        self
    }

    fn recompute(&mut self) {
        let balance = LoanBalance::compute(self.sale_price, &self.payments);
        self.total_received = balance.total_received;
        self.remaining = balance.remaining;
        self.is_paid = balance.is_paid;
    }
}

impl From<LoanRecord> for Loan {
    fn from(record: LoanRecord) -> Self {
        let kind = record
            .kind
            .unwrap_or_else(|| LoanKind::infer_from_description(&record.description));
        let payments = record.migrated_payments();
        let draft = LoanDraft {
            date: record.date,
            due_date: record.due_date,
            description: record.description,
            debtor_name: record.debtor_name,
            debtor_phone: record.debtor_phone,
            sale_price: record.sale_price,
            payments,
            linked_product_id: record.linked_product_id,
            kind,
        };
        Loan::from_draft(record.id, draft)
    }
}

/// A loan that has not yet been assigned an identifier by a store.
#[derive(Debug, Clone, PartialEq)]
pub struct LoanDraft {
    pub date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub description: String,
    pub debtor_name: String,
    pub debtor_phone: Option<String>,
    pub sale_price: Decimal,
    pub payments: Vec<Payment>,
    pub linked_product_id: Option<String>,
    pub kind: LoanKind,
}

impl LoanDraft {
    /// Balance the loan will carry once stored.
    pub fn balance(&self) -> LoanBalance {
        LoanBalance::compute(self.sale_price, &self.payments)
    }
}

/// Category of credit sale, assigned when the loan is created.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum LoanKind {
    #[default]
    Standard,
    Advance,
    Loan,
}

impl LoanKind {
    /// Classifies legacy records by scanning the description for keywords.
    ///
    /// Only used when a stored record predates the explicit `kind` tag.
    pub fn infer_from_description(description: &str) -> Self {
        let lowered = description.to_lowercase();
        let words: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|word| !word.is_empty())
            .collect();
        let has = |candidates: &[&str]| words.iter().any(|word| candidates.contains(word));
        if has(&["advance", "adiantamento"]) {
            LoanKind::Advance
        } else if has(&["loan", "empréstimo", "emprestimo"]) {
            LoanKind::Loan
        } else {
            LoanKind::Standard
        }
    }
}

impl fmt::Display for LoanKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LoanKind::Standard => "Standard",
            LoanKind::Advance => "Advance",
            LoanKind::Loan => "Loan",
        };
        f.write_str(label)
    }
}

/// Derived lifecycle state of a loan relative to a reference date.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum LoanStatus {
    Pending,
    Overdue,
    Paid,
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LoanStatus::Pending => "Pending",
            LoanStatus::Overdue => "Overdue",
            LoanStatus::Paid => "Paid",
        };
        f.write_str(label)
    }
}
