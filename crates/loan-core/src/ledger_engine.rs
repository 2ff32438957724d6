//! Validated, recompute-from-scratch mutations over loans.
//!
//! Every operation borrows its input and returns a new value; the input is
//! left untouched whether the call succeeds or fails.

use std::collections::HashSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use loan_domain::{debtor_key, Loan, LoanDraft, LoanId, LoanKind, Payment};

use crate::error::{LedgerError, LedgerResult, OverpaymentWarning, ValidationError};

/// Input for [`LedgerEngine::create_loan`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewLoan {
    pub sale_price: Decimal,
    pub description: String,
    pub debtor_name: String,
    pub debtor_phone: Option<String>,
    pub date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub initial_payment: Option<Decimal>,
    /// Explicit classification; inferred from the description when absent.
    pub kind: Option<LoanKind>,
    pub linked_product_id: Option<String>,
}

impl NewLoan {
    pub fn new(
        sale_price: Decimal,
        description: impl Into<String>,
        debtor_name: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            sale_price,
            description: description.into(),
            debtor_name: debtor_name.into(),
            debtor_phone: None,
            date,
            due_date: None,
            initial_payment: None,
            kind: None,
            linked_product_id: None,
        }
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.debtor_phone = Some(phone.into());
        self
    }

    pub fn with_due_date(mut self, due_date: NaiveDate) -> Self {
        self.due_date = Some(due_date);
        self
    }

    pub fn with_initial_payment(mut self, amount: Decimal) -> Self {
        self.initial_payment = Some(amount);
        self
    }

    pub fn with_kind(mut self, kind: LoanKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_linked_product(mut self, product_id: impl Into<String>) -> Self {
        self.linked_product_id = Some(product_id.into());
        self
    }
}

/// Input for [`LedgerEngine::transfer_loans`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransferRequest {
    pub source_debtor: String,
    pub target_debtor: String,
    pub loan_ids: Vec<LoanId>,
    /// Replaces the debtor phone; the originating loan's phone is kept when absent.
    pub target_phone: Option<String>,
}

impl TransferRequest {
    pub fn new(
        source_debtor: impl Into<String>,
        target_debtor: impl Into<String>,
        loan_ids: Vec<LoanId>,
    ) -> Self {
        Self {
            source_debtor: source_debtor.into(),
            target_debtor: target_debtor.into(),
            loan_ids,
            target_phone: None,
        }
    }
}

/// Price and description changes accepted by [`LedgerEngine::revise_terms`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LoanTermsEdit {
    pub sale_price: Option<Decimal>,
    pub description: Option<String>,
}

/// Result of a payment mutation: the recomputed loan plus an optional
/// overpayment advisory.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentOutcome {
    pub loan: Loan,
    pub warning: Option<OverpaymentWarning>,
}

impl From<Loan> for PaymentOutcome {
    fn from(loan: Loan) -> Self {
        let warning = loan.balance().excess().map(|excess| OverpaymentWarning {
            loan_id: loan.id(),
            excess,
        });
        Self { loan, warning }
    }
}

/// Pure validation and recomputation logic for loans and their payments.
pub struct LedgerEngine;

impl LedgerEngine {
    /// Validates the request and builds a draft ready for the store.
    pub fn create_loan(request: NewLoan) -> LedgerResult<LoanDraft> {
        ensure_positive_price(request.sale_price)?;
        let description = validated_description(&request.description)?;
        let payments = match request.initial_payment {
            Some(amount) if amount > Decimal::ZERO => vec![Payment::new(request.date, amount)],
            _ => Vec::new(),
        };
        let kind = request
            .kind
            .unwrap_or_else(|| LoanKind::infer_from_description(&description));
        Ok(LoanDraft {
            date: request.date,
            due_date: request.due_date,
            description,
            debtor_name: request.debtor_name,
            debtor_phone: request.debtor_phone,
            sale_price: request.sale_price,
            payments,
            linked_product_id: request.linked_product_id,
            kind,
        })
    }

    /// Appends a payment. Overpayment is applied and reported, not rejected.
    pub fn add_payment(loan: &Loan, amount: Decimal, date: NaiveDate) -> LedgerResult<PaymentOutcome> {
        ensure_positive_amount(amount)?;
        let mut payments = loan.payments().to_vec();
        payments.push(Payment::new(date, amount));
        Ok(PaymentOutcome::from(loan.clone().with_payments(payments)))
    }

    /// Replaces the amount of the payment at `index`, keeping its date.
    pub fn edit_payment(
        loan: &Loan,
        index: usize,
        new_amount: Decimal,
    ) -> LedgerResult<PaymentOutcome> {
        ensure_payment_index(loan, index)?;
        ensure_positive_amount(new_amount)?;
        let mut payments = loan.payments().to_vec();
        payments[index].amount = new_amount;
        Ok(PaymentOutcome::from(loan.clone().with_payments(payments)))
    }

    /// Removes the payment at `index`.
    pub fn delete_payment(loan: &Loan, index: usize) -> LedgerResult<Loan> {
        ensure_payment_index(loan, index)?;
        let mut payments = loan.payments().to_vec();
        payments.remove(index);
        Ok(loan.clone().with_payments(payments))
    }

    /// Reassigns the selected loans from one debtor to another.
    ///
    /// Returns only the loans that changed, in selection order. Sale prices and
    /// payments are carried over untouched.
    pub fn transfer_loans(loans: &[Loan], request: &TransferRequest) -> LedgerResult<Vec<Loan>> {
        let target = request.target_debtor.trim();
        if target.is_empty() {
            return Err(ValidationError::BlankTarget.into());
        }
        let source = debtor_key(&request.source_debtor);
        if source == target {
            return Err(ValidationError::SelfTransfer(source.to_string()).into());
        }
        if request.loan_ids.is_empty() {
            return Err(ValidationError::EmptySelection.into());
        }

        let mut seen = HashSet::new();
        let mut updated = Vec::new();
        for &loan_id in &request.loan_ids {
            if !seen.insert(loan_id) {
                continue;
            }
            let loan = loans
                .iter()
                .find(|loan| loan.id() == loan_id && loan.debtor_key() == source)
                .ok_or_else(|| ValidationError::NotOwnedBySource {
                    loan_id,
                    source_debtor: source.to_string(),
                })?;
            let phone = request
                .target_phone
                .clone()
                .or_else(|| loan.debtor_phone().map(str::to_string));
            updated.push(loan.clone().with_debtor(target, phone));
        }
        Ok(updated)
    }

    /// Returns the collection without the loan identified by `loan_id`.
    pub fn delete_loan(loans: &[Loan], loan_id: LoanId) -> LedgerResult<Vec<Loan>> {
        if !loans.iter().any(|loan| loan.id() == loan_id) {
            return Err(LedgerError::LoanNotFound(loan_id));
        }
        Ok(loans
            .iter()
            .filter(|loan| loan.id() != loan_id)
            .cloned()
            .collect())
    }

    /// Sets or clears the expected payment date.
    pub fn reschedule(loan: &Loan, due_date: Option<NaiveDate>) -> Loan {
        loan.clone().with_due_date(due_date)
    }

    /// Edits the sale price and/or description, validating them as on creation.
    pub fn revise_terms(loan: &Loan, edit: &LoanTermsEdit) -> LedgerResult<Loan> {
        let mut revised = loan.clone();
        if let Some(price) = edit.sale_price {
            ensure_positive_price(price)?;
            revised = revised.with_sale_price(price);
        }
        if let Some(description) = edit.description.as_deref() {
            revised = revised.with_description(validated_description(description)?);
        }
        Ok(revised)
    }
}

fn ensure_positive_price(price: Decimal) -> LedgerResult<()> {
    if price <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveSalePrice.into());
    }
    Ok(())
}

fn ensure_positive_amount(amount: Decimal) -> LedgerResult<()> {
    if amount <= Decimal::ZERO {
        return Err(ValidationError::NonPositiveAmount.into());
    }
    Ok(())
}

fn ensure_payment_index(loan: &Loan, index: usize) -> LedgerResult<()> {
    let len = loan.payments().len();
    if index >= len {
        return Err(LedgerError::PaymentNotFound {
            loan_id: loan.id(),
            index,
            len,
        });
    }
    Ok(())
}

fn validated_description(description: &str) -> LedgerResult<String> {
    let trimmed = description.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::EmptyDescription.into());
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn stored(request: NewLoan) -> Loan {
        Loan::from_draft(Uuid::new_v4(), LedgerEngine::create_loan(request).unwrap())
    }

    #[test]
    fn create_rejects_blank_description() {
        let err = LedgerEngine::create_loan(NewLoan::new(Decimal::TEN, "   ", "Ana", date(1)))
            .expect_err("blank description must fail");
        assert_eq!(err, LedgerError::Validation(ValidationError::EmptyDescription));
    }

    #[test]
    fn create_ignores_non_positive_initial_payment() {
        let draft = LedgerEngine::create_loan(
            NewLoan::new(Decimal::TEN, "Scarf", "Ana", date(1))
                .with_initial_payment(Decimal::ZERO),
        )
        .unwrap();
        assert!(draft.payments.is_empty());
        assert_eq!(draft.balance().remaining, Decimal::TEN);
    }

    #[test]
    fn create_trims_description_and_infers_kind() {
        let draft = LedgerEngine::create_loan(NewLoan::new(
            Decimal::from(200),
            "  Adiantamento quinzena ",
            "Ana",
            date(1),
        ))
        .unwrap();
        assert_eq!(draft.description, "Adiantamento quinzena");
        assert_eq!(draft.kind, LoanKind::Advance);
    }

    #[test]
    fn edit_payment_checks_index_before_amount() {
        let loan = stored(NewLoan::new(Decimal::TEN, "Scarf", "Ana", date(1)));
        let err = LedgerEngine::edit_payment(&loan, 0, Decimal::ZERO).unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn edit_payment_keeps_date_and_warns_on_overpayment() {
        let loan = stored(
            NewLoan::new(Decimal::TEN, "Scarf", "Ana", date(1)).with_initial_payment(Decimal::ONE),
        );
        let outcome = LedgerEngine::edit_payment(&loan, 0, Decimal::from(12)).unwrap();
        assert_eq!(outcome.loan.payments()[0].date, date(1));
        assert_eq!(outcome.loan.remaining(), Decimal::from(-2));
        assert_eq!(
            outcome.warning,
            Some(OverpaymentWarning {
                loan_id: loan.id(),
                excess: Decimal::from(2)
            })
        );
    }

    #[test]
    fn transfer_rejects_self_and_blank_targets() {
        let loan = stored(NewLoan::new(Decimal::TEN, "Scarf", "", date(1)));
        let blank = TransferRequest::new("", "  ", vec![loan.id()]);
        assert_eq!(
            LedgerEngine::transfer_loans(&[loan.clone()], &blank).unwrap_err(),
            LedgerError::Validation(ValidationError::BlankTarget)
        );
        let same = TransferRequest::new("", "Unnamed", vec![loan.id()]);
        assert!(matches!(
            LedgerEngine::transfer_loans(&[loan.clone()], &same).unwrap_err(),
            LedgerError::Validation(ValidationError::SelfTransfer(_))
        ));
        let empty = TransferRequest::new("", "Bia", Vec::new());
        assert_eq!(
            LedgerEngine::transfer_loans(&[loan], &empty).unwrap_err(),
            LedgerError::Validation(ValidationError::EmptySelection)
        );
    }

    #[test]
    fn transfer_rejects_loans_owned_by_someone_else() {
        let ana = stored(NewLoan::new(Decimal::TEN, "Scarf", "Ana", date(1)));
        let bia = stored(NewLoan::new(Decimal::TEN, "Hat", "Bia", date(1)));
        let request = TransferRequest::new("Ana", "Caio", vec![ana.id(), bia.id()]);
        let err = LedgerEngine::transfer_loans(&[ana, bia.clone()], &request).unwrap_err();
        assert_eq!(
            err,
            LedgerError::Validation(ValidationError::NotOwnedBySource {
                loan_id: bia.id(),
                source_debtor: "Ana".into()
            })
        );
    }

    #[test]
    fn transfer_keeps_phone_unless_overridden() {
        let loan = stored(
            NewLoan::new(Decimal::TEN, "Scarf", "Ana", date(1)).with_phone("555-0101"),
        );
        let request = TransferRequest::new("Ana", " Bia ", vec![loan.id(), loan.id()]);
        let moved = LedgerEngine::transfer_loans(&[loan.clone()], &request).unwrap();
        assert_eq!(moved.len(), 1);
        assert_eq!(moved[0].debtor_name(), "Bia");
        assert_eq!(moved[0].debtor_phone(), Some("555-0101"));

        let mut with_phone = request.clone();
        with_phone.target_phone = Some("555-0202".into());
        let moved = LedgerEngine::transfer_loans(&[loan], &with_phone).unwrap();
        assert_eq!(moved[0].debtor_phone(), Some("555-0202"));
    }

    #[test]
    fn revise_terms_validates_and_recomputes() {
        let loan = stored(
            NewLoan::new(Decimal::from(100), "Scarf", "Ana", date(1))
                .with_initial_payment(Decimal::from(40)),
        );
        let edit = LoanTermsEdit {
            sale_price: Some(Decimal::from(40)),
            description: Some("Silk scarf".into()),
        };
        let revised = LedgerEngine::revise_terms(&loan, &edit).unwrap();
        assert!(revised.is_paid());
        assert_eq!(revised.description(), "Silk scarf");
        assert_eq!(revised.debtor_name(), "Ana");

        let bad = LoanTermsEdit {
            sale_price: Some(Decimal::ZERO),
            description: None,
        };
        assert!(LedgerEngine::revise_terms(&loan, &bad)
            .unwrap_err()
            .is_validation());
    }

    #[test]
    fn delete_loan_reports_missing_id() {
        let loan = stored(NewLoan::new(Decimal::TEN, "Scarf", "Ana", date(1)));
        let missing = Uuid::new_v4();
        assert_eq!(
            LedgerEngine::delete_loan(&[loan.clone()], missing).unwrap_err(),
            LedgerError::LoanNotFound(missing)
        );
        assert!(LedgerEngine::delete_loan(&[loan.clone()], loan.id())
            .unwrap()
            .is_empty());
    }
}
