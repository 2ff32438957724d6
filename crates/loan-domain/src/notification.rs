//! Dismissal state for overdue-loan notifications.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::common::LoanId;

/// Set of loan ids whose overdue notification the user dismissed.
///
/// Owned by the caller: loaded and saved at session boundaries and passed
/// into the overdue monitor by value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationState {
    #[serde(default)]
    dismissed: BTreeSet<LoanId>,
}

impl NotificationState {
    /// An empty state: nothing dismissed.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_dismissed(&self, loan_id: LoanId) -> bool {
        self.dismissed.contains(&loan_id)
    }

    /// Returns the state with `loan_id` added to the dismissed set.
    pub fn with_dismissed(mut self, loan_id: LoanId) -> Self {
        self.dismissed.insert(loan_id);
        self
    }

    pub fn dismissed(&self) -> impl Iterator<Item = LoanId> + '_ {
        self.dismissed.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.dismissed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dismissed.is_empty()
    }
}
