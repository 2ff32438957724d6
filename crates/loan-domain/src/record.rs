//! Persisted loan shape, including fields written by older releases.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{common::LoanId, loan::LoanKind, payment::Payment};

/// Loan record as read from storage.
///
/// Stored `remaining` and `isPaid` are ignored; [`crate::Loan`] recomputes them
/// from `sale_price` and `payments` on conversion. A positive `totalReceived`
/// with no itemized payments is kept as a single payment.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanRecord {
    pub id: LoanId,
    pub date: NaiveDate,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    pub description: String,
    #[serde(default)]
    pub debtor_name: String,
    #[serde(default)]
    pub debtor_phone: Option<String>,
    pub sale_price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_received: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remaining: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_paid: Option<bool>,
    #[serde(default)]
    pub linked_product_id: Option<String>,
    #[serde(default)]
    pub payments: Vec<Payment>,
    #[serde(default)]
    pub kind: Option<LoanKind>,
    /// Single received-amount scalar kept by releases before itemized payments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount_received: Option<Decimal>,
}

impl LoanRecord {
    /// Returns the payment list, synthesizing one entry from the legacy scalar
    /// when no itemized payments were stored.
    pub fn migrated_payments(&self) -> Vec<Payment> {
        match self.legacy_payment() {
            Some(payment) => vec![payment],
            None => self.payments.clone(),
        }
    }

    /// Describes the migrations applied when this record is loaded.
    pub fn migration_notes(&self) -> Vec<String> {
        let mut notes = Vec::new();
        if let Some(payment) = self.legacy_payment() {
            notes.push(format!(
                "loan {} migrated legacy received amount {} into a payment",
                self.id, payment.amount
            ));
        }
        if self.kind.is_none() {
            notes.push(format!(
                "loan {} kind inferred from description",
                self.id
            ));
        }
        notes
    }

    /// The stored received scalar, `totalReceived` first and the older
    /// `amountReceived` second, when no itemized payments back it.
    fn legacy_payment(&self) -> Option<Payment> {
        if !self.payments.is_empty() {
            return None;
        }
        self.total_received
            .filter(|amount| *amount > Decimal::ZERO)
            .or_else(|| {
                self.amount_received
                    .filter(|amount| *amount > Decimal::ZERO)
            })
            .map(|amount| Payment::new(self.date, amount))
    }
}
