//! Presence checks for tabular cells.
//!
//! A cell counts as present when it is not the tabular null marker and its
//! trimmed text is not one of [`INVALID_SENTINELS`]. Matching is exact-case:
//! `"None"` is ordinary text.

use serde_json::Value;

pub const INVALID_SENTINELS: [&str; 5] = ["", "null", "NONE", "NaN", "none"];

pub fn is_valid(value: Option<&str>) -> bool {
    match value {
        Some(text) => is_valid_text(text),
        None => false,
    }
}

pub fn is_valid_text(text: &str) -> bool {
    let trimmed = text.trim();
    !INVALID_SENTINELS.contains(&trimmed)
}

/// Same rule for JSON scalars. `null` and non-finite numbers are missing.
pub fn is_valid_json(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(text) => is_valid_text(text),
        Value::Number(number) => number.as_f64().is_none_or(f64::is_finite),
        Value::Bool(_) => true,
        Value::Array(_) | Value::Object(_) => is_valid_text(&value.to_string()),
    }
}

/// Returns the cell text when it is present.
pub fn valid_value(value: Option<&str>) -> Option<&str> {
    value.filter(|text| is_valid_text(text))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn sentinels_are_invalid() {
        for sentinel in INVALID_SENTINELS {
            assert!(!is_valid(Some(sentinel)), "{sentinel:?} should be invalid");
        }
        assert!(!is_valid(Some("  NaN\t")));
        assert!(!is_valid(Some("   ")));
        assert!(!is_valid(None));
    }

    #[test]
    fn other_text_is_valid() {
        assert!(is_valid(Some("0")));
        assert!(is_valid(Some("None")));
        assert!(is_valid(Some("NULL")));
        assert!(is_valid(Some("United Kingdom")));
    }

    #[test]
    fn json_scalars() {
        assert!(is_valid_json(&json!(0)));
        assert!(is_valid_json(&json!(false)));
        assert!(!is_valid_json(&Value::Null));
        assert!(!is_valid_json(&json!("none")));
    }

    #[test]
    fn valid_value_filters() {
        assert_eq!(valid_value(Some("ERR1")), Some("ERR1"));
        assert_eq!(valid_value(Some("null")), None);
    }
}
