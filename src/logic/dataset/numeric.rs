//! Numeric Normalizer
//!
//! Cells use a decimal comma. The validity check is deliberately loose and
//! string based: after swapping `,` for `.`, the token must be ASCII digits
//! with at most one period. Anything else (signs, exponents, spaces, letters,
//! a second period) is the invalid marker, which drops the row upstream.

/// Replace the decimal comma with a period.
pub fn normalize_decimal(token: &str) -> String {
    token.replace(',', ".")
}

/// "Digits with at most one period removed", non-empty.
pub fn looks_numeric(normalized: &str) -> bool {
    let stripped = normalized.replacen('.', "", 1);
    !stripped.is_empty() && stripped.chars().all(|c| c.is_ascii_digit())
}

/// `None` is the invalid marker.
pub fn parse_or_invalid(token: &str) -> Option<f64> {
    let normalized = normalize_decimal(token);
    if !looks_numeric(&normalized) {
        return None;
    }
    normalized.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decimal_comma() {
        assert_eq!(parse_or_invalid("12,5"), Some(12.5));
        assert_eq!(parse_or_invalid("0,0"), Some(0.0));
        assert_eq!(parse_or_invalid("42"), Some(42.0));
        assert_eq!(parse_or_invalid("7."), Some(7.0));
        assert_eq!(parse_or_invalid(",5"), Some(0.5));
    }

    #[test]
    fn test_invalid_marker() {
        assert_eq!(parse_or_invalid("12.5.3"), None);
        assert_eq!(parse_or_invalid("1,2,3"), None);
        assert_eq!(parse_or_invalid("abc"), None);
        assert_eq!(parse_or_invalid(""), None);
        assert_eq!(parse_or_invalid("."), None);
    }

    #[test]
    fn test_loose_grammar_rejects_what_a_float_parser_accepts() {
        // Kept loose on purpose: these are valid floats but invalid cells
        assert_eq!(parse_or_invalid("-1,5"), None);
        assert_eq!(parse_or_invalid("1e3"), None);
        assert_eq!(parse_or_invalid(" 12"), None);
        assert_eq!(parse_or_invalid("+3"), None);
        assert_eq!(parse_or_invalid("NaN"), None);
    }
}
