//! Coercion and comparison helpers for `serde_json::Value` cell values.
//!
//! The expression engine, the conditional-formatting resolver, and the
//! traversal engine all share these rules so that "equal", "blank", and
//! "numeric" mean the same thing everywhere.

use serde_json::Value;
use std::cmp::Ordering;

/// Coerce a value to a number, if it has a numeric reading.
///
/// Strings are parsed after trimming; booleans map to 0/1; everything else
/// has no numeric reading.
pub fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Truthiness: non-empty strings, non-zero numbers and `true` are truthy.
pub fn as_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Null => false,
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}

/// The user-facing string rendering of a value. Null renders empty.
pub fn display_string(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

/// Whether a resolved value renders as nothing.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Strict equality with numeric normalisation, so `2` and `2.0` compare
/// equal regardless of how the cursor surfaced them.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    if let (Some(x), Some(y)) = (numeric_reading(a), numeric_reading(b)) {
        return x == y;
    }
    a == b
}

/// Compare two values numerically if both have a numeric reading.
pub fn number_compare(a: &Value, b: &Value) -> Option<Ordering> {
    let (x, y) = (as_number(a)?, as_number(b)?);
    x.partial_cmp(&y)
}

// Numbers only; string-typed numerals deliberately keep string identity here.
fn numeric_reading(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_as_number_coercions() {
        assert_eq!(as_number(&json!(3.5)), Some(3.5));
        assert_eq!(as_number(&json!(" 42 ")), Some(42.0));
        assert_eq!(as_number(&json!(true)), Some(1.0));
        assert_eq!(as_number(&json!(null)), None);
        assert_eq!(as_number(&json!("abc")), None);
    }

    #[test]
    fn test_truthiness() {
        assert!(as_bool(&json!("x")));
        assert!(as_bool(&json!(1)));
        assert!(!as_bool(&json!("")));
        assert!(!as_bool(&json!(0)));
        assert!(!as_bool(&json!(null)));
    }

    #[test]
    fn test_values_equal_normalises_numbers() {
        assert!(values_equal(&json!(2), &json!(2.0)));
        assert!(!values_equal(&json!(2), &json!("2")));
        assert!(values_equal(&json!("a"), &json!("a")));
    }

    #[test]
    fn test_blankness() {
        assert!(is_blank(&json!(null)));
        assert!(is_blank(&json!("  ")));
        assert!(!is_blank(&json!(0)));
    }

    #[test]
    fn test_number_compare_mismatch_is_none() {
        assert_eq!(number_compare(&json!("abc"), &json!(1)), None);
        assert_eq!(
            number_compare(&json!(2), &json!(10)),
            Some(std::cmp::Ordering::Less)
        );
    }
}
