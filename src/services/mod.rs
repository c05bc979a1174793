pub mod budget;
pub mod ownership;
pub mod posting;

use crate::error::{AppError, AppResult};

/// Largest magnitude, in minor units, accepted for an amount or balance. Keeps
/// negation and SQLite's integer sums clear of `i64` overflow.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000_000;

/// Reject an amount whose magnitude exceeds [`MAX_AMOUNT`].
pub fn check_amount(field: &str, amount: i64) -> AppResult<i64> {
    match amount.checked_abs() {
        Some(magnitude) if magnitude <= MAX_AMOUNT => Ok(amount),
        _ => Err(AppError::Validation(format!(
            "{} {} is out of range (at most {} in magnitude)",
            field, amount, MAX_AMOUNT
        ))),
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_amount_bounds() {
        assert_eq!(check_amount("Amount", 0).unwrap(), 0);
        assert_eq!(check_amount("Amount", MAX_AMOUNT).unwrap(), MAX_AMOUNT);
        assert_eq!(check_amount("Amount", -MAX_AMOUNT).unwrap(), -MAX_AMOUNT);

        for bad in [MAX_AMOUNT + 1, -MAX_AMOUNT - 1, i64::MAX, i64::MIN] {
            let err = check_amount("Amount", bad).unwrap_err();
            assert!(matches!(err, AppError::Validation(_)), "accepted {bad}");
        }
    }
}
