//! Per-debtor aggregation and collection-wide totals.

use std::collections::BTreeSet;

use rust_decimal::Decimal;

use loan_domain::{debtor_key, DebtorGroup, Loan, LoanSummary};

use crate::collation::{collation_key, compare_names};

/// Aggregates loan collections into per-debtor and summary views.
pub struct GroupingService;

impl GroupingService {
    /// Groups loans by debtor.
    ///
    /// Fully paid groups come first; each partition is ordered by debtor name
    /// ignoring case and accents. Loans keep their input order inside a group.
    pub fn group_by_debtor(loans: &[Loan]) -> Vec<DebtorGroup> {
        let mut groups: Vec<DebtorGroup> = Vec::new();
        for loan in loans {
            let key = loan.debtor_key();
            let index = match groups.iter().position(|group| group.debtor_name == key) {
                Some(index) => index,
                None => {
                    groups.push(empty_group(key));
                    groups.len() - 1
                }
            };
            let group = &mut groups[index];
            group.total_sale_price += loan.sale_price();
            group.total_received += loan.total_received();
            group.total_remaining += loan.remaining();
            group.all_paid &= loan.is_paid();
            group.loans.push(loan.clone());
        }
        groups.sort_by(|a, b| {
            b.all_paid
                .cmp(&a.all_paid)
                .then_with(|| compare_names(&a.debtor_name, &b.debtor_name))
        });
        groups
    }

    /// Folds the collection into overall totals.
    pub fn compute_summary(loans: &[Loan]) -> LoanSummary {
        loans.iter().fold(LoanSummary::default(), |mut summary, loan| {
            summary.total_sales += loan.sale_price();
            summary.total_received += loan.total_received();
            summary.total_remaining += loan.remaining();
            summary.total_count += 1;
            if loan.is_paid() {
                summary.paid_count += 1;
            }
            summary
        })
    }

    /// Finds the group for `debtor`, using the same blank-name normalization
    /// as grouping.
    pub fn find_group<'a>(groups: &'a [DebtorGroup], debtor: &str) -> Option<&'a DebtorGroup> {
        let key = debtor_key(debtor);
        groups.iter().find(|group| group.debtor_name == key)
    }

    /// Distinct debtor names in collation order, e.g. to offer transfer targets.
    pub fn debtor_names(loans: &[Loan]) -> Vec<String> {
        let unique: BTreeSet<&str> = loans.iter().map(Loan::debtor_key).collect();
        let mut names: Vec<String> = unique.into_iter().map(str::to_string).collect();
        names.sort_by(|a, b| compare_names(a, b));
        names
    }

    /// Groups whose debtor name contains `query`, ignoring case and accents.
    pub fn search<'a>(groups: &'a [DebtorGroup], query: &str) -> Vec<&'a DebtorGroup> {
        let needle = collation_key(query.trim());
        groups
            .iter()
            .filter(|group| collation_key(&group.debtor_name).contains(&needle))
            .collect()
    }
}

fn empty_group(debtor_name: &str) -> DebtorGroup {
    DebtorGroup {
        debtor_name: debtor_name.to_string(),
        loans: Vec::new(),
        total_sale_price: Decimal::ZERO,
        total_received: Decimal::ZERO,
        total_remaining: Decimal::ZERO,
        all_paid: true,
    }
}
