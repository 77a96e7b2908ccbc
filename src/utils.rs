use chrono::{Days, NaiveDate, NaiveDateTime};

/// Parses a monetary amount as delivered by the order source.
///
/// The backend serializes every amount as a decimal string ("12.50", "-3.00",
/// sometimes padded with whitespace). Returns `None` for anything that does
/// not parse; callers decide whether that is a zero-default or an anomaly.
pub fn parse_money(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Rounds to whole cents. Summaries compare equal within one cent, so all
/// user-facing values pass through this before formatting.
pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The calendar day after `date`. Used to widen the server-side `before`
/// filter, which is exclusive by convention.
pub fn day_after(date: NaiveDate) -> NaiveDate {
    date.checked_add_days(Days::new(1)).unwrap_or(date)
}

/// First instant of `date` (00:00:00).
pub fn day_start(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(0, 0, 0).expect("midnight is always valid")
}

/// Last instant of `date` (23:59:59).
pub fn day_end(date: NaiveDate) -> NaiveDateTime {
    date.and_hms_opt(23, 59, 59)
        .expect("23:59:59 is always valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_money() {
        assert_eq!(parse_money("12.50"), Some(12.5));
        assert_eq!(parse_money(" 100.00 "), Some(100.0));
        assert_eq!(parse_money("-3.00"), Some(-3.0));
        assert_eq!(parse_money("0"), Some(0.0));
        assert_eq!(parse_money(""), None);
        assert_eq!(parse_money("free"), None);
        assert_eq!(parse_money("NaN"), None);
    }

    #[test]
    fn test_round_cents() {
        assert_eq!(round_cents(1.005), 1.0); // binary repr is just under 1.005
        assert_eq!(round_cents(1.006), 1.01);
        assert_eq!(round_cents(-2.499), -2.5);
    }

    #[test]
    fn test_day_after() {
        let date = NaiveDate::from_ymd_opt(2023, 12, 31).unwrap();
        assert_eq!(day_after(date), NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());

        let date = NaiveDate::from_ymd_opt(2024, 2, 28).unwrap();
        assert_eq!(day_after(date), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn test_day_bounds() {
        let date = NaiveDate::from_ymd_opt(2023, 6, 15).unwrap();
        assert_eq!(day_start(date).to_string(), "2023-06-15 00:00:00");
        assert_eq!(day_end(date).to_string(), "2023-06-15 23:59:59");
    }
}
