// Display formatting for magnitudes and release dates
use crate::model::CompareError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

/// Parses a source `release_date` into its calendar date.
///
/// Timestamps with an offset are reduced to their UTC date.
pub fn parse_date(date_str: &str) -> Result<NaiveDate, CompareError> {
    let trimmed = date_str.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.with_timezone(&Utc).date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(dt.date());
    }
    NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
        .map_err(|e| CompareError::Parse(format!("invalid date '{}': {}", date_str, e)))
}

/// Renders a raw date string as "Jan 5, 2024".
pub fn format_date(date_str: &str) -> Result<String, CompareError> {
    parse_date(date_str).map(format_calendar_date)
}

pub fn format_calendar_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Compact magnitude: `1500` → "1.5K", `2_340_000` → "2.3M", `999` → "999".
///
/// Negative and non-finite values are rejected with a parse error.
pub fn format_magnitude(n: f64) -> Result<String, CompareError> {
    if !n.is_finite() || n < 0.0 {
        return Err(CompareError::Parse(format!("cannot format magnitude {}", n)));
    }

    let formatted = if n >= 1_000_000.0 {
        format!("{}M", round_one_decimal(n / 1_000_000.0))
    } else if n >= 1_000.0 {
        format!("{}K", round_one_decimal(n / 1_000.0))
    } else {
        n.to_string()
    };
    Ok(formatted)
}

// Rounds the exact binary value to one decimal. Only a value that is
// exactly halfway (1.25, not 1.4499..) rounds up.
fn round_one_decimal(value: f64) -> String {
    if is_exact_tie(value) {
        // Exact ties are multiples of 1/4, so the scaling is exact.
        format!("{:.1}", (value * 10.0).ceil() / 10.0)
    } else {
        format!("{:.1}", value)
    }
}

fn is_exact_tie(value: f64) -> bool {
    let exact = format!("{:.60}", value);
    let Some((_, frac)) = exact.split_once('.') else {
        return false;
    };
    let digits = frac.as_bytes();
    digits.len() > 1 && digits[1] == b'5' && digits[2..].iter().all(|&d| d == b'0')
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ErrorKind;

    #[test]
    fn magnitude_thresholds() {
        assert_eq!(format_magnitude(999.0).unwrap(), "999");
        assert_eq!(format_magnitude(0.0).unwrap(), "0");
        assert_eq!(format_magnitude(1_000.0).unwrap(), "1.0K");
        assert_eq!(format_magnitude(1_500.0).unwrap(), "1.5K");
        assert_eq!(format_magnitude(1_000_000.0).unwrap(), "1.0M");
        assert_eq!(format_magnitude(2_340_000.0).unwrap(), "2.3M");
    }

    #[test]
    fn magnitude_keeps_fractions_below_thousand() {
        assert_eq!(format_magnitude(523.4).unwrap(), "523.4");
    }

    #[test]
    fn magnitude_rounds_ties_up() {
        assert_eq!(format_magnitude(1_250.0).unwrap(), "1.3K");
        assert_eq!(format_magnitude(2_350_000.0).unwrap(), "2.4M");
    }

    #[test]
    fn magnitude_rounds_stored_value_not_scaled_value() {
        // 1.45 and 4.55 are stored just below the half.
        assert_eq!(format_magnitude(1_450.0).unwrap(), "1.4K");
        assert_eq!(format_magnitude(4_550.0).unwrap(), "4.5K");
        assert_eq!(format_magnitude(8_650_000.0).unwrap(), "8.7M");
        assert_eq!(format_magnitude(1_750.0).unwrap(), "1.8K");
    }

    #[test]
    fn magnitude_rejects_out_of_contract_input() {
        for bad in [-1.0, f64::NAN, f64::INFINITY] {
            let err = format_magnitude(bad).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Parse);
        }
    }

    #[test]
    fn date_formats() {
        assert_eq!(format_date("2024-01-05").unwrap(), "Jan 5, 2024");
        assert_eq!(format_date("2024-01-05T23:10:00Z").unwrap(), "Jan 5, 2024");
        assert_eq!(format_date("2023-12-31T08:00:00").unwrap(), "Dec 31, 2023");
    }

    #[test]
    fn offset_timestamps_use_utc_date() {
        let date = parse_date("2024-01-05T23:30:00-02:00").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 1, 6).unwrap());
    }

    #[test]
    fn invalid_date_is_parse_error() {
        let err = format_date("yesterday").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Parse);
        assert!(err.message().contains("yesterday"));
    }
}
