use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;

use crate::error::IntrinsicError;
use crate::types::{Money, Rate, Years};
use crate::IntrinsicResult;

/// Discount period for a zero-based forecast year.
///
/// End-of-year convention puts year `i` at `i + 1`; the mid-year convention
/// pulls every explicit-period cash flow half a year earlier.
pub fn discount_period(year_index: usize, mid_year: bool) -> Years {
    let end_of_year = Decimal::from(year_index as u64 + 1);
    if mid_year {
        end_of_year - dec!(0.5)
    } else {
        end_of_year
    }
}

/// Compound growth factor `(1 + rate)^period`.
pub fn compound_factor(rate: Rate, period: Years) -> IntrinsicResult<Decimal> {
    if rate <= dec!(-1) {
        return Err(IntrinsicError::InvalidInput {
            field: "rate".into(),
            reason: "Discount rate must be greater than -100%".into(),
        });
    }

    Decimal::ONE
        .checked_add(rate)
        .and_then(|base| base.checked_powd(period))
        .ok_or_else(|| IntrinsicError::InvalidInput {
            field: "rate".into(),
            reason: format!("(1 + {rate})^{period} is not representable"),
        })
}

/// Discount factor `1 / (1 + rate)^period`.
pub fn discount_factor(rate: Rate, period: Years) -> IntrinsicResult<Rate> {
    let factor = compound_factor(rate, period)?;
    Decimal::ONE
        .checked_div(factor)
        .ok_or_else(|| IntrinsicError::DivisionByZero {
            context: format!("discount factor at period {period}"),
        })
}

/// Present value of a single amount received at `period`.
pub fn present_value(amount: Money, rate: Rate, period: Years) -> IntrinsicResult<Money> {
    let factor = compound_factor(rate, period)?;
    amount
        .checked_div(factor)
        .ok_or_else(|| IntrinsicError::DivisionByZero {
            context: format!("present value at period {period}"),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_discount_period_conventions() {
        assert_eq!(discount_period(0, false), dec!(1));
        assert_eq!(discount_period(4, false), dec!(5));
        assert_eq!(discount_period(0, true), dec!(0.5));
        assert_eq!(discount_period(4, true), dec!(4.5));
    }

    #[test]
    fn test_present_value_integer_period() {
        // 121 / 1.1^2 = 100
        let pv = present_value(dec!(121), dec!(0.10), dec!(2)).unwrap();
        assert_eq!(pv, dec!(100));
    }

    #[test]
    fn test_present_value_half_period() {
        // 1.21^0.5 = 1.1
        let pv = present_value(dec!(110), dec!(0.21), dec!(0.5)).unwrap();
        assert!((pv - dec!(100)).abs() < dec!(0.000001), "got {pv}");
    }

    #[test]
    fn test_discount_factor_zero_rate() {
        assert_eq!(discount_factor(Decimal::ZERO, dec!(7)).unwrap(), Decimal::ONE);
    }

    #[test]
    fn test_rate_at_minus_one_rejected() {
        assert!(compound_factor(dec!(-1), dec!(1)).is_err());
        assert!(present_value(dec!(100), dec!(-1.5), dec!(1)).is_err());
    }

    #[test]
    fn test_negative_rate_above_minus_one_accepted() {
        // 81 / 0.9^2 = 100
        let pv = present_value(dec!(81), dec!(-0.10), dec!(2)).unwrap();
        assert_eq!(pv, dec!(100));
    }
}
