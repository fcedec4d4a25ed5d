//! Permissive literal syntax: JSON plus single-quoted strings,
//! `True`/`False`/`None`, tuples, trailing commas and non-string keys.

use serde_json::{Map, Number, Value};

const MAX_DEPTH: usize = 128;

/// Parses `text` as a permissive literal; the whole input must be consumed.
pub fn parse_literal(text: &str) -> Option<Value> {
    let mut parser = LiteralParser::new(text);
    parser.skip_whitespace();
    let value = parser.parse_value(0)?;
    parser.skip_whitespace();
    parser.at_end().then_some(value)
}

struct LiteralParser<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
}

impl<'a> LiteralParser<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            chars: text.chars().peekable(),
        }
    }

    fn at_end(&mut self) -> bool {
        self.chars.peek().is_none()
    }

    fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.chars.next();
        }
    }

    fn expect(&mut self, expected: char) -> Option<()> {
        self.skip_whitespace();
        (self.chars.next()? == expected).then_some(())
    }

    fn parse_value(&mut self, depth: usize) -> Option<Value> {
        if depth > MAX_DEPTH {
            return None;
        }
        self.skip_whitespace();
        match self.peek()? {
            '{' => self.parse_map(depth),
            '[' => self.parse_sequence(']', depth),
            '(' => self.parse_sequence(')', depth),
            '"' | '\'' => self.parse_string().map(Value::String),
            c if c == '-' || c == '+' || c == '.' || c.is_ascii_digit() => self.parse_number(),
            c if c.is_alphabetic() => self.parse_keyword(),
            _ => None,
        }
    }

    fn parse_map(&mut self, depth: usize) -> Option<Value> {
        self.chars.next();
        let mut map = Map::new();

        loop {
            self.skip_whitespace();
            if self.peek()? == '}' {
                self.chars.next();
                return Some(Value::Object(map));
            }

            let key = match self.parse_value(depth + 1)? {
                Value::String(text) => text,
                Value::Number(number) => number.to_string(),
                Value::Bool(flag) => flag.to_string(),
                Value::Null => "null".to_string(),
                _ => return None,
            };
            self.expect(':')?;
            let value = self.parse_value(depth + 1)?;
            map.insert(key, value);

            self.skip_whitespace();
            match self.chars.next()? {
                ',' => continue,
                '}' => return Some(Value::Object(map)),
                _ => return None,
            }
        }
    }

    fn parse_sequence(&mut self, close: char, depth: usize) -> Option<Value> {
        self.chars.next();
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();
            if self.peek()? == close {
                self.chars.next();
                return Some(Value::Array(items));
            }

            items.push(self.parse_value(depth + 1)?);

            self.skip_whitespace();
            match self.chars.next()? {
                ',' => continue,
                c if c == close => return Some(Value::Array(items)),
                _ => return None,
            }
        }
    }

    fn parse_string(&mut self) -> Option<String> {
        let quote = self.chars.next()?;
        let mut out = String::new();

        loop {
            match self.chars.next()? {
                c if c == quote => return Some(out),
                '\\' => out.push(self.parse_escape()?),
                c => out.push(c),
            }
        }
    }

    fn parse_escape(&mut self) -> Option<char> {
        let escaped = match self.chars.next()? {
            'n' => '\n',
            't' => '\t',
            'r' => '\r',
            'b' => '\u{08}',
            'f' => '\u{0c}',
            '0' => '\0',
            'x' => return self.parse_hex(2).and_then(char::from_u32),
            'u' => return self.parse_unicode_escape(),
            other => other,
        };
        Some(escaped)
    }

    fn parse_unicode_escape(&mut self) -> Option<char> {
        let high = self.parse_hex(4)?;
        if !(0xD800..0xDC00).contains(&high) {
            return char::from_u32(high);
        }

        // Surrogate pair: expect a trailing \uXXXX low half.
        if self.chars.next()? != '\\' || self.chars.next()? != 'u' {
            return None;
        }
        let low = self.parse_hex(4)?;
        if !(0xDC00..0xE000).contains(&low) {
            return None;
        }
        char::from_u32(0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00))
    }

    fn parse_hex(&mut self, digits: usize) -> Option<u32> {
        let mut code = 0u32;
        for _ in 0..digits {
            code = code * 16 + self.chars.next()?.to_digit(16)?;
        }
        Some(code)
    }

    fn parse_number(&mut self) -> Option<Value> {
        let mut raw = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() || matches!(c, '-' | '+' | '.' | 'e' | 'E' | '_') {
                raw.push(c);
                self.chars.next();
            } else {
                break;
            }
        }

        let cleaned = raw.replace('_', "");
        let cleaned = cleaned.strip_prefix('+').unwrap_or(&cleaned);
        let is_integer = !cleaned.contains(['.', 'e', 'E']);

        if is_integer {
            if let Ok(int) = cleaned.parse::<i64>() {
                return Some(Value::Number(int.into()));
            }
        }

        let float = cleaned.parse::<f64>().ok()?;
        Number::from_f64(float).map(Value::Number)
    }

    fn parse_keyword(&mut self) -> Option<Value> {
        let mut word = String::new();
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                word.push(c);
                self.chars.next();
            } else {
                break;
            }
        }

        match word.as_str() {
            "True" | "true" => Some(Value::Bool(true)),
            "False" | "false" => Some(Value::Bool(false)),
            "None" | "null" => Some(Value::Null),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_python_style_dict() {
        let value = parse_literal("{'name': 'Temple', 'open': True, 'rating': None}").unwrap();
        assert_eq!(value, json!({"name": "Temple", "open": true, "rating": null}));
    }

    #[test]
    fn tuples_and_trailing_commas() {
        let value = parse_literal("[(1, 2), (3.5, -4),]").unwrap();
        assert_eq!(value, json!([[1, 2], [3.5, -4]]));
    }

    #[test]
    fn numeric_keys_become_text() {
        let value = parse_literal("{1: 'a', 2.5: 'b'}").unwrap();
        assert_eq!(value, json!({"1": "a", "2.5": "b"}));
    }

    #[test]
    fn escapes_inside_strings() {
        let value = parse_literal(r#"{'quote': 'it\'s', "cjk": "天安门"}"#).unwrap();
        assert_eq!(value, json!({"quote": "it's", "cjk": "天安门"}));
    }

    #[test]
    fn mixed_quotes_in_one_payload() {
        let value = parse_literal(r#"{"id": 'B001', 'tags': ["a", 'b']}"#).unwrap();
        assert_eq!(value, json!({"id": "B001", "tags": ["a", "b"]}));
    }

    #[test]
    fn rejects_trailing_garbage_and_unknown_words() {
        assert!(parse_literal("{'a': 1} extra").is_none());
        assert!(parse_literal("{'a': undefined}").is_none());
        assert!(parse_literal("{'a': 1").is_none());
        assert!(parse_literal("'unterminated").is_none());
    }

    #[test]
    fn deep_nesting_is_bounded() {
        let text = "[".repeat(500) + &"]".repeat(500);
        assert!(parse_literal(&text).is_none());
    }
}
