//! Decorator clauses in free-text member metadata.
//!
//! A member's metadata may hold one clause per kind:
//!
//! ```text
//! GetDecorator = @countCalls
//! SetDecorator = [@immutable, @trace('set')]
//! Decorator = {@oneShot, @delayedExec(3)}
//! ```
//!
//! The keyword is matched on word boundaries, so a `Decorator` search never
//! picks up a `SetDecorator` clause. Keywords inside a clause's argument text
//! are ignored; quotes elsewhere are ordinary prose.
//!
//! The expression is either one reference `@name(args)` or a bracketed list
//! of references; the parentheses are optional and the name may be dotted
//! (`@audit.trace`). Argument text is kept raw, for the resolver to evaluate.

use std::fmt;
use std::sync::LazyLock;

use decorum_core::{DecoratorSpec, MemberKind, ParsedAttribute, Span};
use regex::Regex;

use crate::cursor::{Cursor, is_ident_continue, is_ident_start};

static KEYWORDS: LazyLock<Regex> = LazyLock::new(|| {
    let alternatives: Vec<String> = MemberKind::ALL
        .iter()
        .map(|kind| regex::escape(kind.keyword()))
        .collect();
    Regex::new(&format!(r"\b({})\s*=", alternatives.join("|")))
        .expect("decorator keyword pattern is a valid regex")
});

fn kind_for_keyword(keyword: &str) -> Option<MemberKind> {
    MemberKind::ALL.into_iter().find(|kind| kind.keyword() == keyword)
}

/// Why attribute text was set aside.
#[derive(Debug, Clone, PartialEq)]
pub enum Ambiguity {
    /// The keyword was assigned more than once.
    MultipleClauses { count: usize },
    /// The single clause did not hold a valid expression.
    Malformed { span: Span, message: String },
}

impl fmt::Display for Ambiguity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Ambiguity::MultipleClauses { count } => {
                write!(f, "{} clauses for the same keyword", count)
            }
            Ambiguity::Malformed { span, message } => {
                write!(f, "malformed expression at {}: {}", span, message)
            }
        }
    }
}

/// Outcome of looking for one kind's clause in metadata text.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeParse {
    Decorated(ParsedAttribute),
    Undecorated,
    /// Not an error: the member is treated as undecorated for the kind.
    Ambiguous(Ambiguity),
}

/// Find and parse the clause for `kind` in `text`.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn parse_attribute(text: &str, kind: MemberKind) -> AttributeParse {
    let mut found: Vec<Result<Vec<DecoratorSpec>, ParseFailure>> = clauses(text)
        .into_iter()
        .filter(|clause| clause.kind == kind)
        .map(|clause| clause.parsed)
        .collect();

    match found.len() {
        0 => AttributeParse::Undecorated,
        1 => match found.remove(0) {
            Ok(specs) => AttributeParse::Decorated(ParsedAttribute::new(kind, specs)),
            Err((span, message)) => {
                AttributeParse::Ambiguous(Ambiguity::Malformed { span, message })
            }
        },
        count => AttributeParse::Ambiguous(Ambiguity::MultipleClauses { count }),
    }
}

struct Clause {
    kind: MemberKind,
    parsed: Result<Vec<DecoratorSpec>, ParseFailure>,
}

/// Every clause in `text`, scanned left to right.
///
/// A well-formed clause consumes its expression, so keywords inside its
/// argument text are not clauses. Quotes outside an argument list are plain
/// prose.
fn clauses(text: &str) -> Vec<Clause> {
    let mut clauses = Vec::new();
    let mut resume = 0;
    for found in KEYWORDS.captures_iter(text) {
        let (Some(whole), Some(keyword)) = (found.get(0), found.get(1)) else {
            continue;
        };
        if whole.start() < resume {
            continue;
        }
        let Some(kind) = kind_for_keyword(keyword.as_str()) else {
            continue;
        };
        let mut parser = ExpressionParser::new(text, whole.end());
        let parsed = parser.expression();
        resume = match parsed {
            Ok(_) => parser.cursor.offset() as usize,
            Err(_) => whole.end(),
        };
        clauses.push(Clause { kind, parsed });
    }
    clauses
}

type ParseFailure = (Span, String);

struct ExpressionParser<'src> {
    cursor: Cursor<'src>,
}

impl<'src> ExpressionParser<'src> {
    fn new(text: &'src str, offset: usize) -> Self {
        Self {
            cursor: Cursor::at(text, offset),
        }
    }

    fn fail<T>(&self, message: impl Into<String>) -> Result<T, ParseFailure> {
        Err((self.cursor.here(), message.into()))
    }

    fn expression(&mut self) -> Result<Vec<DecoratorSpec>, ParseFailure> {
        self.cursor.skip_whitespace();
        match self.cursor.peek() {
            Some('@') => Ok(vec![self.reference()?]),
            Some(open @ ('[' | '{')) => self.list(open),
            _ => self.fail(format!(
                "expected '@name' or a bracketed list, found {}",
                self.cursor.describe_next()
            )),
        }
    }

    fn list(&mut self, open: char) -> Result<Vec<DecoratorSpec>, ParseFailure> {
        let close = if open == '[' { ']' } else { '}' };
        self.cursor.advance();
        self.cursor.skip_whitespace();

        let mut specs = Vec::new();
        if self.cursor.eat(close) {
            return Ok(specs);
        }
        loop {
            self.cursor.skip_whitespace();
            if self.cursor.peek() != Some('@') {
                return self.fail(format!(
                    "expected '@name', found {}",
                    self.cursor.describe_next()
                ));
            }
            specs.push(self.reference()?);
            self.cursor.skip_whitespace();
            if self.cursor.eat(close) {
                return Ok(specs);
            }
            if !self.cursor.eat(',') {
                return self.fail(format!(
                    "expected ',' or '{}', found {}",
                    close,
                    self.cursor.describe_next()
                ));
            }
        }
    }

    /// `@name`, `@a.b.c`, `@name(raw args)`
    fn reference(&mut self) -> Result<DecoratorSpec, ParseFailure> {
        let mark = self.cursor.mark();
        self.cursor.advance(); // '@'

        let name_start = self.cursor.offset();
        loop {
            if !self.cursor.check(is_ident_start) {
                return self.fail("expected a decorator name");
            }
            self.cursor.eat_while(is_ident_continue);
            let dotted = self.cursor.peek() == Some('.')
                && self.cursor.peek_nth(1).is_some_and(is_ident_start);
            if !dotted {
                break;
            }
            self.cursor.advance();
        }
        let name = self.cursor.slice_from(name_start);

        let args = if self.cursor.peek() == Some('(') {
            self.arguments()?
        } else {
            ""
        };

        Ok(DecoratorSpec::parsed(name, args.trim(), self.cursor.span_from(mark)))
    }

    /// Raw text between balanced parentheses. Nested brackets and quoted
    /// strings are skipped over when looking for the closing parenthesis.
    fn arguments(&mut self) -> Result<&'src str, ParseFailure> {
        let open_span = self.cursor.here();
        self.cursor.advance(); // '('
        let start = self.cursor.offset();
        let mut depth: Vec<char> = Vec::new();

        loop {
            let Some(ch) = self.cursor.peek() else {
                return Err((open_span, "unclosed '('".to_string()));
            };
            match ch {
                ')' if depth.is_empty() => {
                    let args = self.cursor.slice_from(start);
                    self.cursor.advance();
                    return Ok(args);
                }
                '(' => depth.push(')'),
                '[' => depth.push(']'),
                '{' => depth.push('}'),
                ')' | ']' | '}' => {
                    if depth.pop() != Some(ch) {
                        return self.fail(format!("unbalanced '{}' in arguments", ch));
                    }
                }
                '\'' | '"' => {
                    self.skip_string(ch)?;
                    continue;
                }
                _ => {}
            }
            self.cursor.advance();
        }
    }

    fn skip_string(&mut self, quote: char) -> Result<(), ParseFailure> {
        let start = self.cursor.here();
        self.cursor.advance();
        loop {
            match self.cursor.advance() {
                None => return Err((start, "unterminated string in arguments".to_string())),
                Some('\\') => {
                    self.cursor.advance();
                }
                Some(c) if c == quote => return Ok(()),
                Some(_) => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use decorum_core::SpecArgs;

    use super::*;

    fn specs(text: &str, kind: MemberKind) -> Vec<DecoratorSpec> {
        match parse_attribute(text, kind) {
            AttributeParse::Decorated(attribute) => attribute.specs,
            other => panic!("expected a decorated clause in {:?}, got {:?}", text, other),
        }
    }

    fn names(text: &str, kind: MemberKind) -> Vec<String> {
        specs(text, kind).into_iter().map(|s| s.name).collect()
    }

    fn raw_args(spec: &DecoratorSpec) -> &str {
        match &spec.args {
            SpecArgs::Text(text) => text,
            SpecArgs::Values(_) => panic!("parsed specs carry text"),
        }
    }

    #[test]
    fn single_reference() {
        let specs = specs("Decorator = @oneShot(3)", MemberKind::Method);
        assert_eq!(specs.len(), 1);
        assert_eq!(specs[0].name, "oneShot");
        assert_eq!(raw_args(&specs[0]), "3");
        assert_eq!(specs[0].span, Some(Span::new(1, 13, 11)));
    }

    #[test]
    fn parentheses_are_optional() {
        let specs = specs("GetDecorator=@countCalls", MemberKind::Getter);
        assert_eq!(specs[0].name, "countCalls");
        assert_eq!(raw_args(&specs[0]), "");
    }

    #[test]
    fn bracketed_lists_keep_source_order() {
        assert_eq!(
            names("Decorator = [@oneShot, @delayedExec(3)]", MemberKind::Method),
            vec!["oneShot", "delayedExec"]
        );
        assert_eq!(
            names("Decorator = { @a , @b() ,@c(1) }", MemberKind::Method),
            vec!["a", "b", "c"]
        );
        assert!(matches!(
            parse_attribute("Decorator = []", MemberKind::Method),
            AttributeParse::Decorated(ParsedAttribute { ref specs, .. }) if specs.is_empty()
        ));
    }

    #[test]
    fn dotted_names() {
        assert_eq!(
            names("Decorator = @audit.trace('x')", MemberKind::Method),
            vec!["audit.trace"]
        );
    }

    #[test]
    fn arguments_respect_nesting_and_quotes() {
        let specs = specs(
            r#"Decorator = [@trace('a)b', [1, (2)]), @tag("]", {3})]"#,
            MemberKind::Method,
        );
        assert_eq!(specs.len(), 2);
        assert_eq!(raw_args(&specs[0]), "'a)b', [1, (2)]");
        assert_eq!(raw_args(&specs[1]), r#""]", {3}"#);
    }

    #[test]
    fn keywords_do_not_cross_boundaries() {
        let text = "SetDecorator = @immutable\nGetDecorator = @countCalls\nDecorator = @trace";
        assert_eq!(names(text, MemberKind::Setter), vec!["immutable"]);
        assert_eq!(names(text, MemberKind::Getter), vec!["countCalls"]);
        assert_eq!(names(text, MemberKind::Method), vec!["trace"]);

        for (text, kind) in [
            ("SetDecorator = @x", MemberKind::Method),
            ("Decorator = @x", MemberKind::Setter),
            ("MyDecorator = @x", MemberKind::Method),
        ] {
            assert_eq!(parse_attribute(text, kind), AttributeParse::Undecorated);
        }
    }

    #[test]
    fn keywords_inside_strings_are_ignored() {
        let text = "GetDecorator = @trace('Decorator = @oops')";
        assert_eq!(
            parse_attribute(text, MemberKind::Method),
            AttributeParse::Undecorated
        );
        assert_eq!(names(text, MemberKind::Getter), vec!["trace"]);
    }

    #[test]
    fn apostrophes_in_prose_are_not_strings() {
        let text = "Caches the user's balance. GetDecorator = @countCalls";
        assert_eq!(names(text, MemberKind::Getter), vec!["countCalls"]);

        let text = "Don't cache this.\nSetDecorator = @trace('it''s')\nDecorator = @oneShot";
        assert_eq!(names(text, MemberKind::Method), vec!["oneShot"]);
        assert_eq!(names(text, MemberKind::Setter), vec!["trace"]);
    }

    #[test]
    fn malformed_clause_does_not_hide_later_clauses() {
        let text = "Decorator = @a('x\nGetDecorator = @countCalls";
        assert!(matches!(
            parse_attribute(text, MemberKind::Method),
            AttributeParse::Ambiguous(Ambiguity::Malformed { .. })
        ));
        assert_eq!(names(text, MemberKind::Getter), vec!["countCalls"]);
    }

    #[test]
    fn repeated_keyword_is_ambiguous() {
        let parse = parse_attribute("Decorator = @a; Decorator = @b", MemberKind::Method);
        assert_eq!(
            parse,
            AttributeParse::Ambiguous(Ambiguity::MultipleClauses { count: 2 })
        );
    }

    #[test]
    fn malformed_expressions_are_ambiguous() {
        for text in [
            "Decorator = oneShot",
            "Decorator = @",
            "Decorator = @1abc",
            "Decorator = [@a @b]",
            "Decorator = [@a,",
            "Decorator = @a(1",
            "Decorator = @a('x)",
            "Decorator = @a(1])",
            "Decorator =",
        ] {
            assert!(
                matches!(
                    parse_attribute(text, MemberKind::Method),
                    AttributeParse::Ambiguous(Ambiguity::Malformed { .. })
                ),
                "expected ambiguity for {:?}",
                text
            );
        }
    }

    #[test]
    fn no_clause_is_undecorated() {
        for text in ["", "units = 'cm'"] {
            let parse = parse_attribute(text, MemberKind::Getter);
            assert_eq!(parse, AttributeParse::Undecorated);
        }
    }
}
