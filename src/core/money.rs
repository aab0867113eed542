use crate::constants::{BALANCE_TOLERANCE, MONEY_SCALE};
use rust_decimal::{Decimal, RoundingStrategy};

/// Rounds to cents, halves away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

pub fn is_settled(balance: Decimal) -> bool {
    balance.abs() < BALANCE_TOLERANCE
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(10.005), dec!(10.01))]
    #[case(dec!(-10.005), dec!(-10.01))]
    #[case(dec!(33.333333), dec!(33.33))]
    #[case(dec!(0.004), dec!(0.00))]
    #[case(dec!(42), dec!(42))]
    fn rounds_to_cents(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_money(input), expected);
    }

    #[rstest]
    #[case(dec!(0), true)]
    #[case(dec!(0.009), true)]
    #[case(dec!(-0.009), true)]
    #[case(dec!(0.01), false)]
    #[case(dec!(-0.01), false)]
    fn settled_within_a_cent(#[case] balance: Decimal, #[case] expected: bool) {
        assert_eq!(is_settled(balance), expected);
    }
}
