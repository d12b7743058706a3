//! Placeholder substitution for prompt templates.
//!
//! Templates use format-string syntax: `{name}` is replaced by the context
//! value, `{{` and `}}` produce literal braces. A conversion or format spec
//! after the name (`{name!r}`, `{name:>8}`) is accepted and ignored.
//!
//! Non-string values render as `None`, `True`/`False`, and lists/objects as
//! `['a', 'b']` and `{'k': 1}` with single-quoted strings, which is the form
//! the shipped prompt templates are written against.

use serde_json::{Map, Value};

use crate::prompts::PromptError;

/// Render `template` against `context`.
pub fn render(template: &str, context: &Map<String, Value>) -> Result<String, PromptError> {
    let mut out = String::with_capacity(template.len());
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '{' if chars.peek() == Some(&'{') => {
                chars.next();
                out.push('{');
            }
            '{' => {
                let mut field = String::new();
                loop {
                    match chars.next() {
                        Some('}') => break,
                        Some('{') | None => return Err(PromptError::UnbalancedBrace),
                        Some(ch) => field.push(ch),
                    }
                }

                let name = field
                    .split(['!', ':'])
                    .next()
                    .unwrap_or_default()
                    .trim();
                if name.is_empty() {
                    return Err(PromptError::PositionalPlaceholder);
                }

                let value = context
                    .get(name)
                    .ok_or_else(|| PromptError::MissingValue(name.to_string()))?;
                write_value(&mut out, value, false);
            }
            '}' if chars.peek() == Some(&'}') => {
                chars.next();
                out.push('}');
            }
            '}' => return Err(PromptError::UnbalancedBrace),
            other => out.push(other),
        }
    }

    Ok(out)
}

/// Strings are written verbatim at the top level and quoted when `nested`.
fn write_value(out: &mut String, value: &Value, nested: bool) {
    match value {
        Value::Null => out.push_str("None"),
        Value::Bool(true) => out.push_str("True"),
        Value::Bool(false) => out.push_str("False"),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) if nested => write_quoted(out, s),
        Value::String(s) => out.push_str(s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(out, item, true);
            }
            out.push(']');
        }
        Value::Object(map) => {
            out.push('{');
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_quoted(out, key);
                out.push_str(": ");
                write_value(out, item, true);
            }
            out.push('}');
        }
    }
}

/// Single quotes unless the text contains one and no double quote.
fn write_quoted(out: &mut String, s: &str) {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ctx(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_substitutes_values() {
        let rendered = render(
            "Hi {user_name}, level {current_level} ({streak} days)",
            &ctx(json!({"user_name": "Ada", "current_level": "3", "streak": 4})),
        )
        .unwrap();
        assert_eq!(rendered, "Hi Ada, level 3 (4 days)");
    }

    #[test]
    fn test_escaped_braces() {
        let rendered = render(
            "Respond as JSON: {{\"title\": \"{theme}\"}}",
            &ctx(json!({"theme": "Focus"})),
        )
        .unwrap();
        assert_eq!(rendered, "Respond as JSON: {\"title\": \"Focus\"}");
    }

    #[test]
    fn test_structured_values_render_like_templates_expect() {
        let rendered = render("{tasks}", &ctx(json!({"tasks": ["a", "b"]}))).unwrap();
        assert_eq!(rendered, "['a', 'b']");

        let rendered = render(
            "{done} {skipped} {none} {stats}",
            &ctx(json!({
                "done": true,
                "skipped": false,
                "none": null,
                "stats": {"tags": ["x", null, 4]}
            })),
        )
        .unwrap();
        assert_eq!(rendered, "True False None {'tags': ['x', None, 4]}");
    }

    #[test]
    fn test_nested_string_quoting() {
        let rendered = render(
            "{items}",
            &ctx(json!({"items": ["don't", "say \"hi\"", "both ' \"", "a\nb"]})),
        )
        .unwrap();
        assert_eq!(
            rendered,
            r#"["don't", 'say "hi"', 'both \' "', 'a\nb']"#
        );
    }

    #[test]
    fn test_format_spec_ignored() {
        let rendered = render("{name:>10}{name!r}", &ctx(json!({"name": "x"}))).unwrap();
        assert_eq!(rendered, "xx");
    }

    #[test]
    fn test_missing_value() {
        let err = render("Hello {who}", &Map::new()).unwrap_err();
        assert!(matches!(err, PromptError::MissingValue(name) if name == "who"));
    }

    #[test]
    fn test_malformed_templates() {
        assert!(matches!(render("{}", &Map::new()), Err(PromptError::PositionalPlaceholder)));
        assert!(matches!(render("oops {name", &Map::new()), Err(PromptError::UnbalancedBrace)));
        assert!(matches!(render("oops }", &Map::new()), Err(PromptError::UnbalancedBrace)));
    }
}
