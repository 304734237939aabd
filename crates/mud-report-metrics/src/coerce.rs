use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

const DATE_FORMATS: [&str; 6] = [
    "%m/%d/%y", "%m/%d/%Y", "%Y-%m-%d", "%m-%d-%y", "%m-%d-%Y", "%d-%b-%Y",
];

static GROUPED_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[+-]?\d{1,3}(?:,\d{3})+(?:\.\d*)?$").expect("hardcoded grouping regex is valid")
});

/// Parses an extracted value as a number. Commas are accepted only as
/// thousands separators; `10,5` or `1,2,3` do not parse.
#[must_use]
pub fn parse_number(value: &str) -> Option<f64> {
    let value = value.trim();
    let parsed = if value.contains(',') {
        if !GROUPED_NUMBER.is_match(value) {
            return None;
        }
        value.replace(',', "").parse::<f64>()
    } else {
        value.parse::<f64>()
    };
    parsed.ok().filter(|number| number.is_finite())
}

/// Lenient numeric coercion: anything unparseable becomes `0.0`.
#[must_use]
pub fn to_float(value: &str) -> f64 {
    parse_number(value).unwrap_or(0.0)
}

/// Parses a report date, month first for slash and dash forms.
#[must_use]
pub fn parse_report_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;

    use super::{parse_number, parse_report_date, to_float};

    #[test]
    fn coerces_plain_and_grouped_numbers() {
        assert_eq!(to_float(" 10.2 "), 10.2);
        assert_eq!(to_float("1,250"), 1250.0);
        assert_eq!(to_float("12,345,678.5"), 12_345_678.5);
        assert_eq!(parse_number("12."), Some(12.0));
    }

    #[test]
    fn malformed_values_default_to_zero() {
        assert_eq!(to_float(""), 0.0);
        assert_eq!(to_float("10.2.3"), 0.0);
        assert_eq!(to_float("N/A"), 0.0);
        assert_eq!(to_float("inf"), 0.0);
        assert_eq!(parse_number("NaN"), None);
    }

    #[test]
    fn misplaced_commas_do_not_parse() {
        assert_eq!(parse_number("10,5"), None);
        assert_eq!(parse_number("1,2,3"), None);
        assert_eq!(parse_number("1250,"), None);
        assert_eq!(to_float("10,5"), 0.0);
    }

    #[test]
    fn parses_two_and_four_digit_years() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 14);
        assert_eq!(parse_report_date("03/14/24"), expected);
        assert_eq!(parse_report_date("03/14/2024"), expected);
        assert_eq!(parse_report_date("2024-03-14"), expected);
        assert_eq!(parse_report_date("14-Mar-2024"), expected);
    }

    #[test]
    fn unparseable_dates_are_none() {
        assert_eq!(parse_report_date("0"), None);
        assert_eq!(parse_report_date("13/45/24"), None);
    }
}
