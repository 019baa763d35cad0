use chrono::NaiveDate;

/// `numerator / denominator`, defined only for a present, strictly positive
/// denominator and a present numerator.
pub fn safe_ratio(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let denominator = positive(denominator)?;
    finite(numerator? / denominator)
}

/// Same guard as [`safe_ratio`], scaled to a percentage.
pub fn safe_percentage(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    safe_ratio(numerator, denominator).map(|r| r * 100.0)
}

/// Period-over-period change in percent. Undefined when either endpoint is
/// missing or the previous value is zero.
pub fn percent_change(previous: Option<f64>, current: Option<f64>) -> Option<f64> {
    let previous = previous?;
    let current = current?;
    if previous == 0.0 {
        return None;
    }
    finite((current - previous) / previous * 100.0)
}

pub fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| *v > 0.0)
}

pub fn finite(value: f64) -> Option<f64> {
    if value.is_finite() {
        Some(value)
    } else {
        None
    }
}

pub fn sum(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? + b?)
}

pub fn difference(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? - b?)
}

/// Parses a numeric cell. Thousands separators and surrounding whitespace are
/// ignored; blank, dash, NaN and unparseable cells are missing rather than zero.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ',' && *c != '，')
        .collect();

    match cleaned.as_str() {
        "" | "-" | "－" | "—" => None,
        s => s.parse::<f64>().ok().and_then(finite),
    }
}

/// Parses a submission date cell: `2024-06-27`, `2024/06/27`, or a timestamp
/// whose leading ten characters are one of those.
pub fn parse_submission_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let candidates = [trimmed, trimmed.get(..10).unwrap_or(trimmed)];

    candidates.iter().find_map(|s| {
        NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .or_else(|_| NaiveDate::parse_from_str(s, "%Y/%m/%d"))
            .ok()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_ratio_guards_denominator() {
        assert_eq!(safe_ratio(Some(10.0), Some(4.0)), Some(2.5));
        assert_eq!(safe_ratio(Some(10.0), Some(0.0)), None);
        assert_eq!(safe_ratio(Some(10.0), Some(-4.0)), None);
        assert_eq!(safe_ratio(Some(10.0), None), None);
        assert_eq!(safe_ratio(None, Some(4.0)), None);
        assert_eq!(safe_ratio(Some(0.0), Some(4.0)), Some(0.0));
    }

    #[test]
    fn test_safe_percentage() {
        let pct = safe_percentage(Some(1.0), Some(8.0)).unwrap();
        assert!((pct - 12.5).abs() < 1e-9);
    }

    #[test]
    fn test_percent_change() {
        let growth = percent_change(Some(1000.0), Some(1200.0)).unwrap();
        assert!((growth - 20.0).abs() < 1e-9);

        let decline = percent_change(Some(200.0), Some(150.0)).unwrap();
        assert!((decline + 25.0).abs() < 1e-9);

        assert_eq!(percent_change(Some(0.0), Some(150.0)), None);
        assert_eq!(percent_change(None, Some(150.0)), None);
        assert_eq!(percent_change(Some(150.0), None), None);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234,567"), Some(1_234_567.0));
        assert_eq!(parse_amount("  -42.5 "), Some(-42.5));
        assert_eq!(parse_amount("1.5e3"), Some(1500.0));
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("-"), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("n/a"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn test_parse_submission_date() {
        let expected = NaiveDate::from_ymd_opt(2024, 6, 27);
        assert_eq!(parse_submission_date("2024-06-27"), expected);
        assert_eq!(parse_submission_date("2024/06/27"), expected);
        assert_eq!(parse_submission_date("2024-06-27 09:15:00"), expected);
        assert_eq!(parse_submission_date(" 2024-06-27 "), expected);
        assert_eq!(parse_submission_date("27/06/2024"), None);
        assert_eq!(parse_submission_date(""), None);
    }
}
