use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use thiserror::Error;
use tracing::trace;
use tripweave_core::RawPayload;

use crate::literal::parse_literal;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("payload is empty")]
    Empty,
    #[error("payload is a bare {0} value, expected an object or array")]
    NotStructured(&'static str),
    #[error("payload could not be interpreted as structured data")]
    Unparseable,
}

type Stage = fn(&str) -> Option<Value>;

/// Tried in order; the first stage producing an object or array wins.
const STAGES: &[(&str, Stage)] = &[
    ("strict", parse_strict),
    ("balanced-region", parse_balanced_region),
    ("pattern-region", parse_pattern_region),
];

const DELIMITERS: [(char, char); 2] = [('{', '}'), ('[', ']')];

static REGION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)(\{.*\}|\[.*\])").expect("valid region pattern"));

/// Turns a tool-channel payload into an object or array tree.
pub fn decode(raw: &RawPayload) -> Result<Value, DecodeError> {
    match raw {
        RawPayload::Text(text) => decode_text(text),
        RawPayload::Value(value) => match value {
            Value::Object(_) | Value::Array(_) => Ok(value.clone()),
            Value::String(text) => decode_text(text),
            Value::Null => Err(DecodeError::Empty),
            other => Err(DecodeError::NotStructured(kind_name(other))),
        },
    }
}

pub fn decode_text(text: &str) -> Result<Value, DecodeError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(DecodeError::Empty);
    }

    for (name, stage) in STAGES {
        if let Some(value) = stage(text) {
            trace!(stage = *name, "payload decoded");
            return Ok(value);
        }
    }

    match serde_json::from_str::<Value>(text) {
        Ok(scalar) => Err(DecodeError::NotStructured(kind_name(&scalar))),
        Err(_) => Err(DecodeError::Unparseable),
    }
}

fn parse_strict(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text).ok()? {
        // Double-encoded payloads arrive as a JSON string holding JSON.
        Value::String(inner) => serde_json::from_str::<Value>(inner.trim())
            .ok()
            .and_then(structured),
        value => structured(value),
    }
}

fn parse_balanced_region(text: &str) -> Option<Value> {
    DELIMITERS
        .iter()
        .filter_map(|(open, close)| balanced_region(text, *open, *close))
        .find_map(parse_region)
}

fn parse_pattern_region(text: &str) -> Option<Value> {
    let region = REGION_PATTERN.captures(text)?.get(1)?.as_str();
    parse_region(region)
}

fn parse_region(region: &str) -> Option<Value> {
    serde_json::from_str::<Value>(region)
        .ok()
        .and_then(structured)
        .or_else(|| parse_literal(region).and_then(structured))
}

/// First `open ... close` span whose delimiters balance, skipping quoted text.
fn balanced_region(text: &str, open: char, close: char) -> Option<&str> {
    let start = text.find(open)?;
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;

    for (idx, ch) in text[start..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }

        match ch {
            '"' | '\'' => quote = Some(ch),
            c if c == open => depth += 1,
            c if c == close => {
                depth -= 1;
                if depth == 0 {
                    let end = start + idx + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

fn structured(value: Value) -> Option<Value> {
    matches!(value, Value::Object(_) | Value::Array(_)).then_some(value)
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn structured_input_passes_through() {
        let value = json!({"pois": [{"id": "B1"}]});
        let decoded = decode(&RawPayload::Value(value.clone())).unwrap();
        assert_eq!(decoded, value);
    }

    #[test]
    fn well_formed_json_text() {
        let decoded = decode_text(r#"{"status": "1", "count": 2}"#).unwrap();
        assert_eq!(decoded, json!({"status": "1", "count": 2}));
    }

    #[test]
    fn extracts_object_from_prose() {
        let text = r#"Search finished. Result: {"pois": [{"name": "West Lake"}]} Let me know if you need more."#;
        let decoded = decode_text(text).unwrap();
        assert_eq!(decoded, json!({"pois": [{"name": "West Lake"}]}));
    }

    #[test]
    fn extracts_array_when_no_object_present() {
        let decoded = decode_text("items: [1, 2, 3] done").unwrap();
        assert_eq!(decoded, json!([1, 2, 3]));
    }

    #[test]
    fn braces_inside_strings_do_not_end_region() {
        let text = r#"payload {"note": "use } carefully", "ok": true} trailing } noise"#;
        let decoded = decode_text(text).unwrap();
        assert_eq!(decoded, json!({"note": "use } carefully", "ok": true}));
    }

    #[test]
    fn single_quoted_literal_is_accepted() {
        let text = "Tool output: {'pois': [{'id': 'B0FFG', 'location': '120.1,30.2'}], 'ok': True}";
        let decoded = decode_text(text).unwrap();
        assert_eq!(
            decoded,
            json!({"pois": [{"id": "B0FFG", "location": "120.1,30.2"}], "ok": true})
        );
    }

    #[test]
    fn unparseable_object_region_falls_through_to_array() {
        let text = "{oops} then [{\"a\": 1}]";
        let decoded = decode_text(text).unwrap();
        assert_eq!(decoded, json!([{"a": 1}]));
    }

    #[test]
    fn balanced_region_stops_at_matching_close() {
        assert_eq!(balanced_region("a {b {c}} d}", '{', '}'), Some("{b {c}}"));
        assert_eq!(balanced_region("x ['a]', 1] y", '[', ']'), Some("['a]', 1]"));
        assert_eq!(balanced_region("{ open", '{', '}'), None);
    }

    #[test]
    fn pattern_stage_takes_first_open_to_last_close() {
        assert_eq!(
            parse_pattern_region("lead {'a': {'b': 2}} tail"),
            Some(json!({"a": {"b": 2}}))
        );
        assert_eq!(parse_pattern_region("{a} and {b}"), None);
    }

    #[test]
    fn double_encoded_json_is_unwrapped() {
        let decoded = decode(&RawPayload::Value(json!("{\"route\": {}}"))).unwrap();
        assert_eq!(decoded, json!({"route": {}}));
    }

    #[test]
    fn rejects_bare_scalars_and_noise() {
        assert_eq!(decode_text("42"), Err(DecodeError::NotStructured("number")));
        assert_eq!(decode_text("   "), Err(DecodeError::Empty));
        assert_eq!(decode_text("no structure here"), Err(DecodeError::Unparseable));
        assert_eq!(decode_text("{ never closed"), Err(DecodeError::Unparseable));
        assert_eq!(
            decode(&RawPayload::Value(json!(true))),
            Err(DecodeError::NotStructured("boolean"))
        );
        assert_eq!(decode(&RawPayload::Value(Value::Null)), Err(DecodeError::Empty));
    }

    #[test]
    fn decoding_is_deterministic() {
        let text = "result => {'a': (1, 2), 'b': None}";
        assert_eq!(decode_text(text), decode_text(text));
        assert_eq!(decode_text(text).unwrap(), json!({"a": [1, 2], "b": null}));
    }
}
