//! Date Normalizer
//!
//! Timestamp cells come as `DD-<mon>-YY HH:MM:SS` with a Spanish 3-letter
//! month token. Tokens are rewritten to their English form, then parsed.

use chrono::{Datelike, NaiveDateTime};

/// Layout after month substitution
pub const DATE_FORMAT: &str = "%d-%b-%y %H:%M:%S";

/// Localized month token -> canonical token.
/// Matched literally and case-sensitively, applied in this order.
pub const MONTH_TOKENS: [(&str, &str); 12] = [
    ("ene", "Jan"),
    ("feb", "Feb"),
    ("mar", "Mar"),
    ("abr", "Apr"),
    ("may", "May"),
    ("jun", "Jun"),
    ("jul", "Jul"),
    ("ago", "Aug"),
    ("sep", "Sep"),
    ("oct", "Oct"),
    ("nov", "Nov"),
    ("dic", "Dec"),
];

/// Rewrite every localized month token in `raw`.
pub fn canonicalize_months(raw: &str) -> String {
    MONTH_TOKENS
        .iter()
        .fold(raw.to_string(), |acc, (local, canonical)| acc.replace(local, canonical))
}

/// Two-digit years from this one up land in the 1900s (POSIX `%y` pivot)
const CENTURY_PIVOT: i32 = 69;

/// Substitute month tokens and parse. `None` when the result does not match
/// [`DATE_FORMAT`]; the loader turns that into a fatal parse error.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let ts = NaiveDateTime::parse_from_str(&canonicalize_months(raw), DATE_FORMAT).ok()?;

    // chrono pivots at 70, so `69` comes back as 2069
    if ts.year() == 2000 + CENTURY_PIVOT {
        return ts.with_year(1900 + CENTURY_PIVOT);
    }
    Some(ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn test_every_month_token_parses() {
        for (month, (local, _)) in MONTH_TOKENS.iter().enumerate() {
            let cell = format!("15-{}-23 08:30:00", local);
            let ts = parse_timestamp(&cell).unwrap_or_else(|| panic!("failed on {}", cell));

            assert_eq!(ts.month() as usize, month + 1, "month for {}", local);
            assert_eq!(ts.day(), 15);
            assert_eq!(ts.year(), 2023);
            assert_eq!((ts.hour(), ts.minute(), ts.second()), (8, 30, 0));
        }
    }

    #[test]
    fn test_canonical_tokens_pass_through() {
        let ts = parse_timestamp("01-Dec-22 23:59:59").unwrap();
        assert_eq!((ts.year(), ts.month(), ts.day()), (2022, 12, 1));
    }

    #[test]
    fn test_substitution_is_case_sensitive() {
        assert_eq!(canonicalize_months("15-ENE-23 08:30:00"), "15-ENE-23 08:30:00");
        assert_eq!(canonicalize_months("15-ene-23 08:30:00"), "15-Jan-23 08:30:00");
    }

    #[test]
    fn test_two_digit_year_pivot() {
        assert_eq!(parse_timestamp("15-ene-68 08:30:00").map(|t| t.year()), Some(2068));
        assert_eq!(parse_timestamp("15-ene-69 08:30:00").map(|t| t.year()), Some(1969));
        assert_eq!(parse_timestamp("15-ene-70 08:30:00").map(|t| t.year()), Some(1970));
        assert_eq!(parse_timestamp("31-dic-99 23:59:59").map(|t| t.year()), Some(1999));
        assert_eq!(parse_timestamp("01-ene-00 00:00:00").map(|t| t.year()), Some(2000));
    }

    #[test]
    fn test_rejects_unknown_month_and_bad_fields() {
        assert!(parse_timestamp("15-xyz-23 08:30:00").is_none());
        assert!(parse_timestamp("15-mar-23 8h30").is_none());
        assert!(parse_timestamp("2023-03-15 08:30:00").is_none());
        assert!(parse_timestamp("").is_none());
    }
}
