//! Strips NUL bytes from JSON payloads before they reach Postgres, which
//! rejects them in text columns. Applied recursively so the raw-payload
//! blob is as clean as the structured columns derived from it.

use serde_json::Value;

pub fn sanitize_value(value: &Value) -> Value {
    match value {
        Value::String(s) => Value::String(strip_nul(s)),
        Value::Array(items) => Value::Array(items.iter().map(sanitize_value).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), sanitize_value(v)))
                .collect(),
        ),
        other => other.clone(),
    }
}

pub fn strip_nul(s: &str) -> String {
    if s.as_bytes().contains(&0) {
        s.chars().filter(|&c| c != '\0').collect()
    } else {
        s.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn strips_nul_from_plain_string() {
        assert_eq!(strip_nul("hi\u{0}bye"), "hibye");
    }

    #[test]
    fn leaves_clean_strings_untouched() {
        assert_eq!(strip_nul("clean"), "clean");
    }

    #[test]
    fn recurses_into_nested_structures() {
        let input = json!({
            "content": "hi\u{0}bye",
            "embeds": [{"title": "t\u{0}itle"}],
            "mentions": [1, 2, 3],
        });
        let sanitized = sanitize_value(&input);
        assert_eq!(sanitized["content"], "hibye");
        assert_eq!(sanitized["embeds"][0]["title"], "title");
        assert_eq!(sanitized["mentions"], json!([1, 2, 3]));
    }

    #[test]
    fn no_persisted_string_contains_a_zero_byte() {
        let input = json!("a\u{0}b\u{0}c\u{0}");
        let sanitized = sanitize_value(&input);
        assert_eq!(sanitized, json!("abc"));
    }
}
