//! Sandboxed evaluator for decorator argument text.
//!
//! Argument text is the part between the parentheses of `@name(...)`. It is
//! evaluated as a comma-separated list of literals and nothing else:
//!
//! - integers: `42`, `-7`, `1_000`, `0x1F`, `0b101`, `0o17`
//! - floats: `0.5`, `.5`, `3e2`, `-1.5E-3`, `inf`, `nan`
//! - strings: `'single'` or `"double"`, with `\n \t \r \0 \\ \' \"` escapes
//! - `true`, `false`, `null`
//! - lists: `[1, 2]` or `{1, 2}`, nested freely
//!
//! Any other identifier is rejected: the text has no access to variables,
//! functions or anything else in the enclosing program.

use decorum_core::{Dynamic, LiteralError};

use crate::cursor::{Cursor, Mark, is_ident_continue, is_ident_start};

/// Evaluate argument text into an ordered argument list.
///
/// Empty or whitespace-only text yields an empty list.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn evaluate_arguments(text: &str) -> Result<Vec<Dynamic>, LiteralError> {
    let mut evaluator = Evaluator {
        cursor: Cursor::new(text),
    };
    evaluator.arguments()
}

struct Evaluator<'src> {
    cursor: Cursor<'src>,
}

impl Evaluator<'_> {
    fn arguments(&mut self) -> Result<Vec<Dynamic>, LiteralError> {
        let mut values = Vec::new();
        self.cursor.skip_whitespace();
        if self.cursor.is_eof() {
            return Ok(values);
        }
        loop {
            values.push(self.value()?);
            self.cursor.skip_whitespace();
            if self.cursor.is_eof() {
                return Ok(values);
            }
            if !self.cursor.eat(',') {
                return Err(self.expected("',' or end of arguments"));
            }
            self.cursor.skip_whitespace();
        }
    }

    fn expected(&self, expected: &'static str) -> LiteralError {
        LiteralError::Expected {
            expected,
            found: self.cursor.describe_next(),
            span: self.cursor.here(),
        }
    }

    fn value(&mut self) -> Result<Dynamic, LiteralError> {
        match self.cursor.peek() {
            Some(sign @ ('-' | '+')) => {
                let mark = self.cursor.mark();
                self.cursor.advance();
                self.cursor.skip_whitespace();
                self.signed(mark, sign == '-')
            }
            Some(c) if c.is_ascii_digit() => self.number(false),
            Some('.') if self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit()) => {
                self.number(false)
            }
            Some(quote @ ('\'' | '"')) => self.string(quote),
            Some(open @ ('[' | '{')) => self.list(open),
            Some(c) if is_ident_start(c) => self.keyword(),
            Some(ch) => Err(LiteralError::UnexpectedChar {
                ch,
                span: self.cursor.here(),
            }),
            None => Err(self.expected("a literal")),
        }
    }

    fn signed(&mut self, mark: Mark, negative: bool) -> Result<Dynamic, LiteralError> {
        match self.number_like(negative)? {
            Dynamic::Int(v) => Ok(Dynamic::Int(v)),
            Dynamic::Float(v) => Ok(Dynamic::Float(v)),
            other => Err(LiteralError::Expected {
                expected: "a number after the sign",
                found: other.type_name().to_string(),
                span: self.cursor.span_from(mark),
            }),
        }
    }

    /// A number, `inf` or `nan`, with the sign already consumed.
    fn number_like(&mut self, negative: bool) -> Result<Dynamic, LiteralError> {
        match self.cursor.peek() {
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(negative),
            Some(c) if is_ident_start(c) => match self.keyword()? {
                Dynamic::Float(v) if negative => Ok(Dynamic::Float(-v)),
                Dynamic::Float(v) => Ok(Dynamic::Float(v)),
                other => Ok(other),
            },
            _ => Err(self.expected("a number")),
        }
    }

    fn number(&mut self, negative: bool) -> Result<Dynamic, LiteralError> {
        let mark = self.cursor.mark();

        if self.cursor.peek() == Some('0') {
            let radix = match self.cursor.peek_nth(1) {
                Some('x' | 'X') => Some(16),
                Some('b' | 'B') => Some(2),
                Some('o' | 'O') => Some(8),
                _ => None,
            };
            if let Some(radix) = radix {
                self.cursor.advance();
                self.cursor.advance();
                let digits: String = self
                    .cursor
                    .eat_while(|c| c.is_digit(radix) || c == '_')
                    .chars()
                    .filter(|c| *c != '_')
                    .collect();
                let span = self.cursor.span_from(mark);
                if digits.is_empty() {
                    return Err(LiteralError::InvalidNumber {
                        span,
                        detail: "expected digits after radix prefix".into(),
                    });
                }
                let signed = if negative { format!("-{digits}") } else { digits };
                return i64::from_str_radix(&signed, radix)
                    .map(Dynamic::Int)
                    .map_err(|e| LiteralError::InvalidNumber {
                        span,
                        detail: e.to_string(),
                    });
            }
        }

        let mut is_float = false;
        self.digits();
        let fraction = self.cursor.peek() == Some('.')
            && self.cursor.peek_nth(1).is_some_and(|c| c.is_ascii_digit());
        if fraction {
            self.cursor.advance();
            self.digits();
            is_float = true;
        }
        if let Some('e' | 'E') = self.cursor.peek() {
            self.cursor.advance();
            if matches!(self.cursor.peek(), Some('+' | '-')) {
                self.cursor.advance();
            }
            if !self.cursor.check(|c| c.is_ascii_digit()) {
                return Err(LiteralError::InvalidNumber {
                    span: self.cursor.span_from(mark),
                    detail: "expected digits in exponent".into(),
                });
            }
            self.digits();
            is_float = true;
        }
        // `3abc` is not a number followed by an identifier
        if self.cursor.check(is_ident_continue) {
            self.cursor.eat_while(is_ident_continue);
            return Err(LiteralError::InvalidNumber {
                span: self.cursor.span_from(mark),
                detail: format!("'{}' is not a number", self.cursor.slice_from(mark.offset)),
            });
        }

        let span = self.cursor.span_from(mark);
        let mut text: String = self
            .cursor
            .slice_from(mark.offset)
            .chars()
            .filter(|c| *c != '_')
            .collect();
        if negative {
            text.insert(0, '-');
        }

        if is_float {
            text.parse::<f64>()
                .map(Dynamic::Float)
                .map_err(|e| LiteralError::InvalidNumber {
                    span,
                    detail: e.to_string(),
                })
        } else {
            text.parse::<i64>()
                .map(Dynamic::Int)
                .map_err(|e| LiteralError::InvalidNumber {
                    span,
                    detail: e.to_string(),
                })
        }
    }

    fn digits(&mut self) {
        self.cursor.eat_while(|c| c.is_ascii_digit() || c == '_');
    }

    fn string(&mut self, quote: char) -> Result<Dynamic, LiteralError> {
        let mark = self.cursor.mark();
        self.cursor.advance();
        let mut value = String::new();
        loop {
            match self.cursor.advance() {
                None => {
                    return Err(LiteralError::UnterminatedString {
                        span: self.cursor.span_from(mark),
                    });
                }
                Some('\\') => match self.cursor.advance() {
                    Some('n') => value.push('\n'),
                    Some('t') => value.push('\t'),
                    Some('r') => value.push('\r'),
                    Some('0') => value.push('\0'),
                    Some(other) => value.push(other),
                    None => {
                        return Err(LiteralError::UnterminatedString {
                            span: self.cursor.span_from(mark),
                        });
                    }
                },
                Some(c) if c == quote => return Ok(Dynamic::String(value)),
                Some(c) => value.push(c),
            }
        }
    }

    fn list(&mut self, open: char) -> Result<Dynamic, LiteralError> {
        let close = if open == '[' { ']' } else { '}' };
        let expected = if open == '[' { "',' or ']'" } else { "',' or '}'" };
        self.cursor.advance();
        self.cursor.skip_whitespace();

        let mut items = Vec::new();
        if self.cursor.eat(close) {
            return Ok(Dynamic::List(items));
        }
        loop {
            items.push(self.value()?);
            self.cursor.skip_whitespace();
            if self.cursor.eat(close) {
                return Ok(Dynamic::List(items));
            }
            if !self.cursor.eat(',') {
                return Err(self.expected(expected));
            }
            self.cursor.skip_whitespace();
        }
    }

    fn keyword(&mut self) -> Result<Dynamic, LiteralError> {
        let mark = self.cursor.mark();
        let word = self.cursor.eat_while(is_ident_continue);
        match word {
            "true" => Ok(Dynamic::Bool(true)),
            "false" => Ok(Dynamic::Bool(false)),
            "null" => Ok(Dynamic::Null),
            "inf" | "Inf" => Ok(Dynamic::Float(f64::INFINITY)),
            "nan" | "NaN" => Ok(Dynamic::Float(f64::NAN)),
            _ => Err(LiteralError::UnknownIdentifier {
                name: word.to_string(),
                span: self.cursor.span_from(mark),
            }),
        }
    }
}
