//! Structured-output recovery for generated text.
//!
//! The upstream model is asked for JSON but frequently wraps it in prose or
//! markdown, or emits slightly broken JSON. [`parse_structured`] tries a fixed
//! sequence of strategies, least destructive first, and never fails:
//!
//! ```text
//! 1. whole trimmed text
//! 2. contents of the first ``` fenced block (optionally tagged json)
//! 3. first '{' .. last '}' as-is
//! 4. same slice with raw newlines escaped
//! 5. same slice with every ' replaced by "
//! 6. fallback record { raw_response, parse_error: true }
//! ```
//!
//! Strategy 5 is a blind replace: legitimate apostrophes inside string values
//! get turned into quotes and usually make the slice undecodable, in which case
//! the fallback record is returned.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("fenced block pattern is valid")
});

/// Outcome of parsing generated text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParsedResult {
    /// Decoded JSON value.
    Structured(Value),
    /// No strategy produced a value; the text is returned untouched.
    Unparsed {
        raw_response: String,
        parse_error: bool,
    },
}

impl ParsedResult {
    fn fallback(text: &str) -> Self {
        ParsedResult::Unparsed {
            raw_response: text.to_string(),
            parse_error: true,
        }
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(self, ParsedResult::Unparsed { .. })
    }

    pub fn as_value(&self) -> Option<&Value> {
        match self {
            ParsedResult::Structured(value) => Some(value),
            ParsedResult::Unparsed { .. } => None,
        }
    }
}

/// Extract a structured value from generated text.
pub fn parse_structured(text: &str) -> ParsedResult {
    let text = text.trim();

    if let Some(value) = try_decode(text) {
        return ParsedResult::Structured(value);
    }

    if let Some(inner) = FENCED_BLOCK.captures(text).and_then(|c| c.get(1)) {
        if let Some(value) = try_decode(inner.as_str()) {
            return ParsedResult::Structured(value);
        }
    }

    if let Some(slice) = brace_slice(text) {
        let repairs: [fn(&str) -> String; 3] = [
            str::to_string,
            |s| s.replace('\n', "\\n"),
            |s| s.replace('\'', "\""),
        ];
        for repair in repairs {
            if let Some(value) = try_decode(&repair(slice)) {
                return ParsedResult::Structured(value);
            }
        }
    }

    ParsedResult::fallback(text)
}

/// Slice from the first `{` to the last `}` inclusive.
fn brace_slice(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Decode JSON, treating empty or falsy values as a miss.
fn try_decode(content: &str) -> Option<Value> {
    serde_json::from_str::<Value>(content)
        .ok()
        .filter(is_truthy)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn structured(text: &str) -> Value {
        match parse_structured(text) {
            ParsedResult::Structured(v) => v,
            other => panic!("expected structured result, got {other:?}"),
        }
    }

    #[test]
    fn test_direct_json() {
        assert_eq!(structured(r#"{"a": 1}"#), json!({"a": 1}));
        assert_eq!(structured("  \n{\"a\": 1}\n  "), json!({"a": 1}));
    }

    #[test]
    fn test_fenced_block() {
        assert_eq!(structured("```json\n{\"a\":1}\n```"), json!({"a": 1}));
        assert_eq!(
            structured("Here you go:\n```\n{\"level\": 2}\n```\nEnjoy!"),
            json!({"level": 2})
        );
    }

    #[test]
    fn test_embedded_object() {
        assert_eq!(
            structured(r#"Sure! {"title": "Deep work", "tasks": ["a", "b"]} Good luck."#),
            json!({"title": "Deep work", "tasks": ["a", "b"]})
        );
    }

    #[test]
    fn test_newline_repair() {
        let text = "Result:\n{\"note\": \"line one\nline two\"}";
        assert_eq!(structured(text), json!({"note": "line one\nline two"}));
    }

    #[test]
    fn test_single_quote_repair() {
        assert_eq!(structured("here is {'a': 1} ok"), json!({"a": 1}));
    }

    #[test]
    fn test_single_quote_repair_corrupts_apostrophes() {
        // The blind replace turns "don't" into "don"t", so this degrades to the fallback.
        let text = "Result: {'tip': 'don't stop'}";
        assert_eq!(
            parse_structured(text),
            ParsedResult::Unparsed {
                raw_response: text.to_string(),
                parse_error: true,
            }
        );

        // Valid JSON containing apostrophes never reaches the repair step.
        assert_eq!(structured(r#"{"tip": "don't stop"}"#), json!({"tip": "don't stop"}));
    }

    #[test]
    fn test_fallback_preserves_text() {
        let result = parse_structured("not json at all");
        assert!(result.is_parse_error());
        assert_eq!(
            serde_json::to_value(&result).unwrap(),
            json!({"raw_response": "not json at all", "parse_error": true})
        );
    }

    #[test]
    fn test_fallback_uses_trimmed_text() {
        let result = parse_structured("  nothing here }{  ");
        assert_eq!(
            result,
            ParsedResult::Unparsed {
                raw_response: "nothing here }{".to_string(),
                parse_error: true,
            }
        );
    }

    #[test]
    fn test_empty_values_fall_through() {
        assert!(parse_structured("{}").is_parse_error());
        assert!(parse_structured("").is_parse_error());
        assert!(parse_structured("null").is_parse_error());
        assert!(parse_structured("0").is_parse_error());
    }

    #[test]
    fn test_non_object_values_are_accepted() {
        assert_eq!(structured("[1, 2]"), json!([1, 2]));
        assert_eq!(structured("\"text\""), json!("text"));
    }

    #[test]
    fn test_serializes_structured_transparently() {
        let result = parse_structured(r#"{"a": [1]}"#);
        assert_eq!(serde_json::to_value(&result).unwrap(), json!({"a": [1]}));
        assert_eq!(result.as_value(), Some(&json!({"a": [1]})));
    }
}
