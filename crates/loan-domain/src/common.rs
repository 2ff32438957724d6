//! Shared identifiers, the amount trait, and debtor-name helpers for loan primitives.

use rust_decimal::Decimal;
use uuid::Uuid;

/// Identifier assigned to a loan by the store that persisted it.
pub type LoanId = Uuid;

/// Debtor label used when a loan carries a blank debtor name.
pub const UNNAMED_DEBTOR: &str = "Unnamed";

/// Supplies a common contract for retrieving monetary amounts.
pub trait Amounted {
    fn amount(&self) -> Decimal;
}

/// Returns the grouping key for a debtor name: trimmed, with blanks mapped to
/// [`UNNAMED_DEBTOR`].
pub fn debtor_key(name: &str) -> &str {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        UNNAMED_DEBTOR
    } else {
        trimmed
    }
}
