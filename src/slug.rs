use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]").expect("slug pattern compiles"));

/// Lowercases `text` and deletes everything outside `[a-z0-9]`.
pub fn normalize(text: &str) -> String {
    let lowered = text.to_lowercase();
    NON_ALNUM.replace_all(&lowered, "").into_owned()
}

/// Non-string JSON yields an empty slug.
pub fn normalize_value(value: &Value) -> String {
    match value {
        Value::String(text) => normalize(text),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn strips_punctuation_and_spaces() {
        assert_eq!(normalize("Monkeypox virus"), "monkeypoxvirus");
        assert_eq!(
            normalize("Severe acute respiratory syndrome coronavirus 2"),
            "severeacuterespiratorysyndromecoronavirus2"
        );
        assert_eq!(normalize("E. coli O157:H7"), "ecolio157h7");
    }

    #[test]
    fn drops_non_ascii_letters() {
        assert_eq!(normalize("Café Ωmega"), "cafmega");
    }

    #[test]
    fn idempotent() {
        for input in ["Monkeypox virus", "  ", "Ünïcode-42", "abc123"] {
            let once = normalize(input);
            assert_eq!(normalize(&once), once);
            assert!(once.chars().all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit()));
        }
    }

    #[test]
    fn non_text_is_empty() {
        assert_eq!(normalize_value(&json!(10244)), "");
        assert_eq!(normalize_value(&Value::Null), "");
        assert_eq!(normalize_value(&json!("Zika Virus")), "zikavirus");
    }
}
