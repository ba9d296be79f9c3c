//! Display patterns: formatting a resolved value before it reaches the
//! sink. Numeric patterns are DecimalFormat-style (`0.00`, `#,##0.00`);
//! date patterns use chrono's strftime syntax and apply to ISO-formatted
//! string values.

use brass_types::as_number;
use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

/// Applies a display pattern to a value. Values the pattern cannot apply
/// to pass through unchanged, never failing the cell.
pub fn apply_pattern(value: &Value, pattern: &str) -> Value {
    if pattern.contains('%') {
        if let Value::String(s) = value {
            if let Some(formatted) = format_date(s, pattern) {
                return Value::String(formatted);
            }
        }
        return value.clone();
    }
    if pattern.chars().any(|c| c == '0' || c == '#') {
        if let Some(n) = numeric_only(value) {
            return Value::String(format_number(n, pattern));
        }
    }
    value.clone()
}

fn numeric_only(value: &Value) -> Option<f64> {
    match value {
        Value::Number(_) => as_number(value),
        _ => None,
    }
}

fn format_date(s: &str, pattern: &str) -> Option<String> {
    // Plain dates go through midnight so time specifiers in the pattern
    // render 00:00 instead of failing.
    let dt = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;
    Some(dt.format(pattern).to_string())
}

/// DecimalFormat-style numeric rendering: the digits after `.` fix the
/// decimal places; a `,` anywhere asks for thousands grouping.
fn format_number(n: f64, pattern: &str) -> String {
    let decimals = pattern
        .rsplit_once('.')
        .map(|(_, frac)| frac.chars().filter(|c| *c == '0' || *c == '#').count())
        .unwrap_or(0);
    let grouped = pattern.contains(',');

    let rendered = format!("{:.*}", decimals, n.abs());
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (rendered, None),
    };

    let int_part = if grouped { group_thousands(&int_part) } else { int_part };

    let mut out = String::new();
    if n < 0.0 {
        out.push('-');
    }
    out.push_str(&int_part);
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(&frac);
    }
    out
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    let chars: Vec<char> = digits.chars().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(*c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fixed_decimals() {
        assert_eq!(apply_pattern(&json!(3.14159), "0.00"), json!("3.14"));
        assert_eq!(apply_pattern(&json!(2), "0.00"), json!("2.00"));
    }

    #[test]
    fn test_thousands_grouping() {
        assert_eq!(apply_pattern(&json!(1234567.891), "#,##0.00"), json!("1,234,567.89"));
        assert_eq!(apply_pattern(&json!(999), "#,##0"), json!("999"));
    }

    #[test]
    fn test_negative_numbers() {
        assert_eq!(apply_pattern(&json!(-1234.5), "#,##0.0"), json!("-1,234.5"));
    }

    #[test]
    fn test_date_pattern() {
        assert_eq!(apply_pattern(&json!("2026-08-07"), "%d.%m.%Y"), json!("07.08.2026"));
        assert_eq!(
            apply_pattern(&json!("2026-08-07T14:30:00"), "%H:%M"),
            json!("14:30")
        );
    }

    #[test]
    fn test_inapplicable_pattern_passes_through() {
        assert_eq!(apply_pattern(&json!("hello"), "0.00"), json!("hello"));
        assert_eq!(apply_pattern(&json!(null), "0.00"), json!(null));
        assert_eq!(apply_pattern(&json!("not a date"), "%Y"), json!("not a date"));
    }
}
