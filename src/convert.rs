use crate::domain::ExchangeRate;
use rust_decimal::Decimal;

/// Convert `amount` from one currency into another using the rate table.
///
/// Resolution order:
/// - same currency (case-insensitive): the amount passes through unchanged
/// - direct rate `from -> to`, latest date wins: `amount * rate`
/// - inverted rate `to -> from`, latest date wins: `amount / rate`
///
/// Returns `None` when no rate is available either way. Callers must fall back
/// to the unconverted amount, never treat a missing rate as zero.
pub fn convert(
    amount: Decimal,
    from: &str,
    to: &str,
    rates: &[ExchangeRate],
) -> Option<Decimal> {
    if from.eq_ignore_ascii_case(to) {
        return Some(amount);
    }

    if let Some(rate) = latest_rate(rates, from, to) {
        return Some(amount * rate.rate);
    }

    if let Some(rate) = latest_rate(rates, to, from) {
        if rate.rate.is_zero() {
            return None;
        }
        return Some(amount / rate.rate);
    }

    None
}

/// Latest entry for the pair. Same-date ties resolve to the entry appearing
/// later in the table, so repeated imports deterministically overwrite.
fn latest_rate<'a>(rates: &'a [ExchangeRate], from: &str, to: &str) -> Option<&'a ExchangeRate> {
    let mut best: Option<&ExchangeRate> = None;
    for rate in rates {
        if !rate.from.eq_ignore_ascii_case(from) || !rate.to.eq_ignore_ascii_case(to) {
            continue;
        }
        match best {
            Some(found) if rate.date < found.date => {}
            _ => best = Some(rate),
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn rate(from: &str, to: &str, rate: Decimal, date: (i32, u32, u32)) -> ExchangeRate {
        ExchangeRate {
            from: from.to_string(),
            to: to.to_string(),
            rate,
            date: NaiveDate::from_ymd_opt(date.0, date.1, date.2).expect("date"),
        }
    }

    #[test]
    fn same_currency_is_identity() {
        let rates = vec![rate("USD", "EUR", dec!(0.9), (2024, 1, 1))];
        assert_eq!(convert(dec!(42.50), "USD", "USD", &rates), Some(dec!(42.50)));
        assert_eq!(convert(dec!(10), "eur", "EUR", &[]), Some(dec!(10)));
    }

    #[test]
    fn direct_rate_multiplies() {
        let rates = vec![rate("USD", "EUR", dec!(0.9), (2024, 1, 1))];
        assert_eq!(convert(dec!(100), "USD", "EUR", &rates), Some(dec!(90.0)));
    }

    #[test]
    fn inverse_rate_divides() {
        // Only EUR->USD stored; converting USD->EUR must use the inverse.
        let rates = vec![rate("EUR", "USD", dec!(2), (2024, 1, 1))];
        assert_eq!(convert(dec!(100), "USD", "EUR", &rates), Some(dec!(50)));
    }

    #[test]
    fn latest_rate_wins_regardless_of_order() {
        let rates = vec![
            rate("USD", "EUR", dec!(0.5), (2024, 6, 1)),
            rate("USD", "EUR", dec!(0.9), (2024, 1, 1)),
        ];
        assert_eq!(convert(dec!(100), "USD", "EUR", &rates), Some(dec!(50.0)));

        let reordered = vec![
            rate("USD", "EUR", dec!(0.9), (2024, 1, 1)),
            rate("USD", "EUR", dec!(0.5), (2024, 6, 1)),
        ];
        assert_eq!(convert(dec!(100), "USD", "EUR", &reordered), Some(dec!(50.0)));
    }

    #[test]
    fn same_date_tie_goes_to_last_entry() {
        let rates = vec![
            rate("USD", "EUR", dec!(0.9), (2024, 1, 1)),
            rate("USD", "EUR", dec!(0.8), (2024, 1, 1)),
        ];
        assert_eq!(convert(dec!(100), "USD", "EUR", &rates), Some(dec!(80.0)));
    }

    #[test]
    fn direct_rate_preferred_over_inverse() {
        let rates = vec![
            rate("EUR", "USD", dec!(2), (2024, 6, 1)),
            rate("USD", "EUR", dec!(0.9), (2024, 1, 1)),
        ];
        assert_eq!(convert(dec!(100), "USD", "EUR", &rates), Some(dec!(90.0)));
    }

    #[test]
    fn missing_rate_returns_none() {
        assert_eq!(convert(dec!(100), "USD", "EUR", &[]), None);
        let unrelated = vec![rate("GBP", "JPY", dec!(190), (2024, 1, 1))];
        assert_eq!(convert(dec!(100), "USD", "EUR", &unrelated), None);
    }

    #[test]
    fn zero_inverse_rate_is_treated_as_missing() {
        let rates = vec![rate("EUR", "USD", dec!(0), (2024, 1, 1))];
        assert_eq!(convert(dec!(100), "USD", "EUR", &rates), None);
    }

    #[test]
    fn currency_codes_compare_case_insensitively() {
        let rates = vec![rate("usd", "eur", dec!(0.9), (2024, 1, 1))];
        assert_eq!(convert(dec!(10), "USD", "EUR", &rates), Some(dec!(9.0)));
    }
}
