//! Shared numeric helpers: guarded ratios, weighted averages, date spans.

use chrono::NaiveDate;
use rust_decimal::Decimal;

/// `numerator / denominator`, or zero when the denominator is zero.
///
/// A quotient outside the `Decimal` range saturates to [`Decimal::MAX`] or
/// [`Decimal::MIN`] according to its sign.
///
/// # Examples
///
/// ```
/// use facility_rollup::core::numeric::safe_ratio;
/// use rust_decimal::Decimal;
/// use rust_decimal_macros::dec;
///
/// assert_eq!(safe_ratio(dec!(50), dec!(200)), dec!(0.25));
/// assert_eq!(safe_ratio(dec!(50), Decimal::ZERO), Decimal::ZERO);
/// ```
pub fn safe_ratio(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        return Decimal::ZERO;
    }
    numerator
        .checked_div(denominator)
        .unwrap_or_else(|| saturate(numerator.is_sign_negative() != denominator.is_sign_negative()))
}

fn saturate(negative: bool) -> Decimal {
    if negative {
        Decimal::MIN
    } else {
        Decimal::MAX
    }
}

fn saturating_add(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or_else(|| saturate(a.is_sign_negative()))
}

fn saturating_mul(a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b)
        .unwrap_or_else(|| saturate(a.is_sign_negative() != b.is_sign_negative()))
}

/// Weighted mean of `values` under `weights`.
///
/// The two slices are paired position by position; extra entries on the
/// longer side are ignored. Returns zero for an empty input or when the
/// weights sum to zero. Sums that leave the `Decimal` range saturate.
pub fn weighted_average(values: &[Decimal], weights: &[Decimal]) -> Decimal {
    let mut weighted_sum = Decimal::ZERO;
    let mut weight_sum = Decimal::ZERO;
    for (value, weight) in values.iter().zip(weights) {
        weighted_sum = saturating_add(weighted_sum, saturating_mul(*value, *weight));
        weight_sum = saturating_add(weight_sum, *weight);
    }
    safe_ratio(weighted_sum, weight_sum)
}

/// Weighted mean over the observations that are present.
///
/// Absent values are dropped together with their weights before averaging,
/// so the weight set is re-aligned to the surviving values. Returns `None`
/// when no value is present.
pub fn weighted_average_present(values: &[Option<Decimal>], weights: &[Decimal]) -> Option<Decimal> {
    let (present, present_weights): (Vec<Decimal>, Vec<Decimal>) = values
        .iter()
        .zip(weights)
        .filter_map(|(value, weight)| value.map(|v| (v, *weight)))
        .unzip();
    if present.is_empty() {
        None
    } else {
        Some(weighted_average(&present, &present_weights))
    }
}

/// Signed number of days from `from` to `to`.
pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// Whole months between two dates, ignoring the day-of-month remainder.
pub fn months_between(from: NaiveDate, to: NaiveDate) -> i64 {
    use chrono::Datelike;
    let months = (to.year() as i64 - from.year() as i64) * 12 + to.month() as i64 - from.month() as i64;
    if to.day() < from.day() {
        months - 1
    } else {
        months
    }
}

/// Absolute difference between two values is within `tolerance`.
pub fn approx_eq(a: Decimal, b: Decimal, tolerance: Decimal) -> bool {
    (a - b).abs() <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_safe_ratio() {
        assert_eq!(safe_ratio(dec!(1), dec!(4)), dec!(0.25));
        assert_eq!(safe_ratio(dec!(1), Decimal::ZERO), Decimal::ZERO);
        assert_eq!(safe_ratio(Decimal::ZERO, Decimal::ZERO), Decimal::ZERO);
    }

    #[test]
    fn test_safe_ratio_saturates_on_overflow() {
        let tiny = Decimal::new(1, 22);
        assert_eq!(safe_ratio(dec!(100000000000), tiny), Decimal::MAX);
        assert_eq!(safe_ratio(dec!(-100000000000), tiny), Decimal::MIN);
    }

    #[test]
    fn test_weighted_average_extreme_inputs() {
        let values = [Decimal::MAX, Decimal::MAX];
        let weights = [dec!(1000), dec!(1000)];
        assert_eq!(weighted_average(&values, &weights), safe_ratio(Decimal::MAX, dec!(2000)));

        let weights = [Decimal::MAX, Decimal::MAX];
        let values = [dec!(1), dec!(1)];
        assert_eq!(weighted_average(&values, &weights), dec!(1));
    }

    #[test]
    fn test_weighted_average_empty() {
        assert_eq!(weighted_average(&[], &[]), Decimal::ZERO);
    }

    #[test]
    fn test_weighted_average_zero_weights() {
        let values = [dec!(150), dec!(250)];
        let weights = [Decimal::ZERO, Decimal::ZERO];
        assert_eq!(weighted_average(&values, &weights), Decimal::ZERO);
    }

    #[test]
    fn test_weighted_average_single() {
        assert_eq!(weighted_average(&[dec!(175)], &[dec!(0.001)]), dec!(175));
    }

    #[test]
    fn test_weighted_average_spread() {
        // 100 @ 150bps, 300 @ 250bps
        let values = [dec!(150), dec!(250)];
        let weights = [dec!(100), dec!(300)];
        assert_eq!(weighted_average(&values, &weights), dec!(225));
    }

    #[test]
    fn test_weighted_average_present_realigns_weights() {
        let values = [Some(dec!(1.5)), None, Some(dec!(2.5))];
        let weights = [dec!(100), dec!(10_000), dec!(300)];
        // The large weight belongs to the missing value and must not dilute.
        assert_eq!(weighted_average_present(&values, &weights), Some(dec!(2.25)));
    }

    #[test]
    fn test_weighted_average_present_all_missing() {
        let values = [None, None];
        let weights = [dec!(100), dec!(300)];
        assert_eq!(weighted_average_present(&values, &weights), None);
    }

    #[test]
    fn test_weighted_average_present_zero_weights() {
        let values = [Some(dec!(1.2))];
        let weights = [Decimal::ZERO];
        assert_eq!(weighted_average_present(&values, &weights), Some(Decimal::ZERO));
    }

    #[test]
    fn test_days_between() {
        let a = NaiveDate::from_ymd_opt(2024, 1, 31).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert_eq!(days_between(a, b), 30);
        assert_eq!(days_between(b, a), -30);
    }

    #[test]
    fn test_months_between() {
        let a = NaiveDate::from_ymd_opt(2022, 1, 15).unwrap();
        let b = NaiveDate::from_ymd_opt(2025, 1, 15).unwrap();
        let c = NaiveDate::from_ymd_opt(2025, 1, 14).unwrap();
        assert_eq!(months_between(a, b), 36);
        assert_eq!(months_between(a, c), 35);
    }
}
