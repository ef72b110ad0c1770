//! Lenient number parsing and compact number formatting for attribute values.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref RE_LEADING_NUMBER: Regex =
        Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").unwrap();
}

/// Parse the leading number of an attribute value, ignoring any trailing
/// unit or garbage (`"50%"` -> 50, `"12px"` -> 12). `None` when the value
/// does not start with a number.
pub fn parse_number(raw: &str) -> Option<f64> {
    RE_LEADING_NUMBER
        .find(raw.trim_start())
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

/// Format a number the way it should appear in an attribute: integers
/// without a decimal point, no negative zero.
pub fn fmt_num(n: f64) -> String {
    if n == 0.0 {
        return "0".to_string();
    }
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_number_prefix() {
        assert_eq!(parse_number("12"), Some(12.0));
        assert_eq!(parse_number(" -3.5px"), Some(-3.5));
        assert_eq!(parse_number("50%"), Some(50.0));
        assert_eq!(parse_number(".25"), Some(0.25));
        assert_eq!(parse_number("1e2"), Some(100.0));
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_fmt_num() {
        assert_eq!(fmt_num(20.0), "20");
        assert_eq!(fmt_num(-0.0), "0");
        assert_eq!(fmt_num(1.5), "1.5");
        assert_eq!(fmt_num(-10.0), "-10");
    }
}
