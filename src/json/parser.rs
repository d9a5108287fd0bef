//! Recursive-descent parser for change documents
//!
//! Dispatches on the lookahead character to one of four productions
//! (object, array, string, literal/number). Structural violations are errors
//! carrying a byte offset; malformed literals and numbers degrade to null and
//! `0.0` in lenient mode, which is what existing change documents rely on.

use std::collections::BTreeMap;

use crate::core::config::ParseMode;
use crate::core::error::ParseError;
use crate::json::value::Value;

/// Nesting limit for objects and arrays.
const MAX_DEPTH: usize = 256;

/// Parse `text` leniently.
pub fn parse(text: &str) -> Result<Value, ParseError> {
    parse_with_mode(text, ParseMode::Lenient)
}

/// Parse `text` with the given strictness.
pub fn parse_with_mode(text: &str, mode: ParseMode) -> Result<Value, ParseError> {
    let mut parser = Parser::new(text, mode);
    let value = parser.parse_value()?;

    if mode == ParseMode::Strict {
        parser.skip_whitespace();
        if !parser.is_eof() {
            return Err(ParseError::new("unexpected trailing content", parser.pos));
        }
    }

    Ok(value)
}

impl std::str::FromStr for Value {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse(s)
    }
}

struct Parser<'a> {
    source: &'a str,
    pos: usize,
    depth: usize,
    mode: ParseMode,
}

impl<'a> Parser<'a> {
    fn new(source: &'a str, mode: ParseMode) -> Self {
        Self {
            source,
            pos: 0,
            depth: 0,
            mode,
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_is(&self, expected: char) -> bool {
        self.peek() == Some(expected)
    }

    fn advance(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn eat_while(&mut self, predicate: impl Fn(char) -> bool) {
        while let Some(ch) = self.peek() {
            if predicate(ch) {
                self.advance();
            } else {
                break;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        self.eat_while(|c| matches!(c, ' ' | '\t' | '\r' | '\n'));
    }

    fn expect(&mut self, expected: char) -> Result<(), ParseError> {
        if self.peek_is(expected) {
            self.pos += expected.len_utf8();
            Ok(())
        } else {
            Err(ParseError::new(format!("expected '{}'", expected), self.pos))
        }
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        self.skip_whitespace();
        match self.peek() {
            None => Ok(Value::Null),
            Some('{') => self.nested(Self::parse_object),
            Some('[') => self.nested(Self::parse_array),
            Some('"') => self.parse_string().map(Value::String),
            Some('t') => self.parse_literal("true", Value::Bool(true)),
            Some('f') => self.parse_literal("false", Value::Bool(false)),
            Some('n') => self.parse_literal("null", Value::Null),
            Some(_) => self.parse_number(),
        }
    }

    fn nested(
        &mut self,
        production: fn(&mut Self) -> Result<Value, ParseError>,
    ) -> Result<Value, ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::new("nesting too deep", self.pos));
        }
        self.depth += 1;
        let result = production(self);
        self.depth -= 1;
        result
    }

    fn parse_object(&mut self) -> Result<Value, ParseError> {
        let mut map = BTreeMap::new();
        self.expect('{')?;
        self.skip_whitespace();
        if self.peek_is('}') {
            self.pos += 1;
            return Ok(Value::Map(map));
        }

        loop {
            self.skip_whitespace();
            let key = self.parse_string()?;
            self.skip_whitespace();
            self.expect(':')?;
            self.skip_whitespace();
            let value = self.parse_value()?;
            map.insert(key, value);
            self.skip_whitespace();
            if self.peek_is('}') {
                self.pos += 1;
                break;
            }
            self.expect(',')?;
        }

        Ok(Value::Map(map))
    }

    fn parse_array(&mut self) -> Result<Value, ParseError> {
        let mut items = Vec::new();
        self.expect('[')?;
        self.skip_whitespace();
        if self.peek_is(']') {
            self.pos += 1;
            return Ok(Value::List(items));
        }

        loop {
            self.skip_whitespace();
            items.push(self.parse_value()?);
            self.skip_whitespace();
            if self.peek_is(']') {
                self.pos += 1;
                break;
            }
            self.expect(',')?;
        }

        Ok(Value::List(items))
    }

    fn parse_string(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        self.expect('"')?;
        let mut out = String::new();

        loop {
            let Some(ch) = self.advance() else {
                return Err(ParseError::new("unterminated string", start));
            };
            match ch {
                '"' => return Ok(out),
                '\\' => {
                    let Some(esc) = self.advance() else {
                        return Err(ParseError::new("unterminated string", start));
                    };
                    match esc {
                        '"' => out.push('"'),
                        '\\' => out.push('\\'),
                        '/' => out.push('/'),
                        'b' => out.push('\u{08}'),
                        'f' => out.push('\u{0C}'),
                        'n' => out.push('\n'),
                        'r' => out.push('\r'),
                        't' => out.push('\t'),
                        'u' => {
                            if let Some(ch) = self.parse_unicode_escape()? {
                                out.push(ch);
                            }
                        }
                        // Unknown escapes are dropped
                        _ => {}
                    }
                }
                c => out.push(c),
            }
        }
    }

    /// Reads the four hex digits after `\u`. Returns `None` when fewer than
    /// four characters remain, in which case the escape is dropped.
    fn parse_unicode_escape(&mut self) -> Result<Option<char>, ParseError> {
        let rest = &self.source[self.pos..];
        let digits: String = rest.chars().take(4).collect();
        if digits.chars().count() < 4 {
            return Ok(None);
        }
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseError::new(
                format!("invalid unicode escape '\\u{}'", digits),
                self.pos,
            ));
        }

        self.pos += digits.len();
        let unit = u32::from_str_radix(&digits, 16)
            .map_err(|_| ParseError::new("invalid unicode escape", self.pos))?;

        if (0xD800..=0xDBFF).contains(&unit) {
            if let Some(low) = self.low_surrogate_escape() {
                self.pos += 6;
                let code = 0x10000 + ((unit - 0xD800) << 10) + (low - 0xDC00);
                return Ok(Some(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)));
            }
        }

        // Lone surrogates cannot live in a Rust string
        Ok(Some(char::from_u32(unit).unwrap_or(char::REPLACEMENT_CHARACTER)))
    }

    /// The low half of a surrogate pair, if `\uDC00`-`\uDFFF` follows.
    fn low_surrogate_escape(&self) -> Option<u32> {
        let hex = self.source[self.pos..].strip_prefix("\\u")?.get(..4)?;
        let unit = u32::from_str_radix(hex, 16).ok()?;
        (0xDC00..=0xDFFF).contains(&unit).then_some(unit)
    }

    fn parse_literal(&mut self, literal: &str, value: Value) -> Result<Value, ParseError> {
        if self.source[self.pos..].starts_with(literal) {
            self.pos += literal.len();
            return Ok(value);
        }

        match self.mode {
            ParseMode::Lenient => Ok(Value::Null),
            ParseMode::Strict => Err(ParseError::new(
                format!("invalid literal, expected '{}'", literal),
                self.pos,
            )),
        }
    }

    fn parse_number(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        if self.peek_is('-') {
            self.pos += 1;
        }
        self.eat_while(|c| c.is_ascii_digit());
        if self.peek_is('.') {
            self.pos += 1;
            self.eat_while(|c| c.is_ascii_digit());
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.pos += 1;
            if matches!(self.peek(), Some('+' | '-')) {
                self.pos += 1;
            }
            self.eat_while(|c| c.is_ascii_digit());
        }

        let text = &self.source[start..self.pos];
        match text.parse::<f64>() {
            Ok(n) => Ok(Value::Number(n)),
            Err(_) if self.mode == ParseMode::Strict => {
                let message = match self.peek() {
                    Some(c) if text.is_empty() => format!("unexpected character '{}'", c),
                    _ => format!("invalid number '{}'", text),
                };
                Err(ParseError::new(message, start))
            }
            Err(_) => Ok(Value::Number(0.0)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: Vec<(&str, Value)>) -> Value {
        Value::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        )
    }

    #[test]
    fn test_object_with_nested_array() {
        let value = parse(r#"{"a":1,"b":[true,null,"x"]}"#).unwrap();
        let expected = map(vec![
            ("a", Value::Number(1.0)),
            (
                "b",
                Value::List(vec![Value::Bool(true), Value::Null, Value::from("x")]),
            ),
        ]);
        assert_eq!(value, expected);
    }

    #[test]
    fn test_whitespace_between_tokens() {
        let value = parse(" \t{ \"a\" :\r\n [ 1 , 2 ] } \n").unwrap();
        assert_eq!(
            value,
            map(vec![(
                "a",
                Value::List(vec![Value::Number(1.0), Value::Number(2.0)])
            )])
        );
    }

    #[test]
    fn test_empty_containers() {
        assert_eq!(parse("{}").unwrap(), Value::Map(BTreeMap::new()));
        assert_eq!(parse("[ ]").unwrap(), Value::List(vec![]));
    }

    #[test]
    fn test_duplicate_key_last_wins() {
        let value = parse(r#"{"a":1,"a":2}"#).unwrap();
        assert_eq!(value.get("a"), Some(&Value::Number(2.0)));
        assert_eq!(value.as_map().map(|m| m.len()), Some(1));
    }

    #[test]
    fn test_top_level_scalars() {
        assert_eq!(parse("\"hi\"").unwrap(), Value::from("hi"));
        assert_eq!(parse("false").unwrap(), Value::Bool(false));
        assert_eq!(parse("-2.5e2").unwrap(), Value::Number(-250.0));
        assert_eq!(parse("").unwrap(), Value::Null);
        assert_eq!(parse("   ").unwrap(), Value::Null);
    }

    #[test]
    fn test_malformed_literal_is_null() {
        assert_eq!(parse("tru").unwrap(), Value::Null);
        assert_eq!(parse("nul").unwrap(), Value::Null);
        assert_eq!(parse("[fals]").unwrap_err().offset, 1);
    }

    #[test]
    fn test_malformed_literal_strict() {
        let err = parse_with_mode("tru", ParseMode::Strict).unwrap_err();
        assert_eq!(err.offset, 0);
        assert!(err.message.contains("true"));
    }

    #[test]
    fn test_trailing_content() {
        assert_eq!(parse("1 2").unwrap(), Value::Number(1.0));
        let err = parse_with_mode("1 2", ParseMode::Strict).unwrap_err();
        assert_eq!(err.offset, 2);
    }

    #[test]
    fn test_unparseable_number_is_zero() {
        assert_eq!(parse("-").unwrap(), Value::Number(0.0));
        assert_eq!(parse("1e").unwrap(), Value::Number(0.0));
        assert_eq!(parse("x").unwrap(), Value::Number(0.0));
        assert!(parse_with_mode("x", ParseMode::Strict).is_err());
    }

    #[test]
    fn test_unterminated_object() {
        let err = parse(r#"{"a":1"#).unwrap_err();
        assert_eq!(err.offset, 6);
        assert!(err.message.contains("','"));
    }

    #[test]
    fn test_unterminated_array() {
        let err = parse("[1, 2").unwrap_err();
        assert_eq!(err.offset, 5);
    }

    #[test]
    fn test_unterminated_string() {
        let err = parse(r#"{"a":"abc"#).unwrap_err();
        assert_eq!(err.message, "unterminated string");
        assert_eq!(err.offset, 5);
    }

    #[test]
    fn test_missing_colon() {
        let err = parse(r#"{"a" 1}"#).unwrap_err();
        assert_eq!(err.message, "expected ':'");
        assert_eq!(err.offset, 5);
    }

    #[test]
    fn test_unquoted_key() {
        let err = parse("{a:1}").unwrap_err();
        assert_eq!(err.offset, 1);
    }

    #[test]
    fn test_escapes() {
        let value = parse(r#""q\"b\\s\/n\nt\tb\bf\fr\r""#).unwrap();
        assert_eq!(value, Value::from("q\"b\\s/n\nt\tb\u{08}f\u{0C}r\r"));
    }

    #[test]
    fn test_unicode_escape() {
        assert_eq!(parse(r#""caf\u00e9""#).unwrap(), Value::from("café"));
        assert_eq!(
            parse(r#""\ud83d""#).unwrap(),
            Value::from("\u{FFFD}")
        );
    }

    #[test]
    fn test_surrogate_pair_escape() {
        assert_eq!(parse(r#""\uD83D\uDD25""#).unwrap(), Value::from("\u{1F525}"));
        assert_eq!(
            parse(r#""Burn \ud83d\udd25 twice""#).unwrap(),
            Value::from("Burn \u{1F525} twice")
        );
    }

    #[test]
    fn test_unpaired_surrogates_are_replaced() {
        // High surrogate followed by something other than a low surrogate
        assert_eq!(
            parse(r#""\uD83Dx\uD83D\u0041""#).unwrap(),
            Value::from("\u{FFFD}x\u{FFFD}A")
        );
        // Low surrogate on its own
        assert_eq!(parse(r#""\uDD25""#).unwrap(), Value::from("\u{FFFD}"));
    }

    #[test]
    fn test_invalid_unicode_escape() {
        let err = parse(r#""\uzzzz""#).unwrap_err();
        assert_eq!(err.offset, 3);
    }

    #[test]
    fn test_short_unicode_escape_is_dropped() {
        assert_eq!(parse(r#""\u12""#).unwrap(), Value::from("12"));
    }

    #[test]
    fn test_unknown_escape_dropped() {
        assert_eq!(parse(r#""a\qb""#).unwrap(), Value::from("ab"));
    }

    #[test]
    fn test_multibyte_text_offsets_are_bytes() {
        let err = parse("[\"é\" 1]").unwrap_err();
        assert_eq!(err.offset, 6);
    }

    #[test]
    fn test_nesting_limit() {
        let deep = "[".repeat(MAX_DEPTH + 1);
        let err = parse(&deep).unwrap_err();
        assert_eq!(err.message, "nesting too deep");
    }

    #[test]
    fn test_from_str() {
        let value: Value = "[1]".parse().unwrap();
        assert_eq!(value, Value::List(vec![Value::Number(1.0)]));
    }
}
