//! Two-decimal rounding and fixed-point formatting of amounts.

use rust_decimal::{Decimal, RoundingStrategy};

/// Round to two decimal places, half away from zero.
///
/// Idempotent: rounding an already rounded value returns it unchanged.
pub fn round_amount(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Format an amount with exactly two decimals ("1234.50", "-0.10", "0.00").
///
/// Negative zero is printed as "0.00".
pub fn format_amount(value: Decimal) -> String {
    let mut rounded = round_amount(value);
    if rounded.is_zero() {
        rounded = Decimal::ZERO;
    }
    rounded.rescale(2);
    rounded.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn rounds_half_away_from_zero() {
        assert_eq!(round_amount(dec!(1.005)), dec!(1.01));
        assert_eq!(round_amount(dec!(-1.005)), dec!(-1.01));
        assert_eq!(round_amount(dec!(2.344)), dec!(2.34));
        assert_eq!(round_amount(dec!(2.345)), dec!(2.35));
    }

    #[test]
    fn rounding_is_idempotent() {
        let once = round_amount(dec!(1234.5678));
        assert_eq!(round_amount(once), once);
    }

    #[test]
    fn format_amount_cases() {
        assert_eq!(format_amount(dec!(100)), "100.00");
        assert_eq!(format_amount(dec!(1500.5)), "1500.50");
        assert_eq!(format_amount(dec!(49.90)), "49.90");
        assert_eq!(format_amount(dec!(0.005)), "0.01");
        assert_eq!(format_amount(dec!(-0.001)), "0.00");
        assert_eq!(format_amount(dec!(-12.5)), "-12.50");
        assert_eq!(format_amount(Decimal::ZERO), "0.00");
    }
}
