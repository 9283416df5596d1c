use decorum_core::Span;

/// A saved cursor position, used to build spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mark {
    pub offset: u32,
    pub line: u32,
    pub column: u32,
}

/// A cursor over metadata or argument text that tracks position.
///
/// Provides character access with peek/advance semantics and keeps byte
/// offset, line and column in step as it advances.
pub struct Cursor<'src> {
    /// The full text being scanned.
    source: &'src str,
    /// Remaining text (slice starting at current position).
    rest: &'src str,
    offset: u32,
    line: u32,
    column: u32,
}

impl<'src> Cursor<'src> {
    /// Create a cursor at the start of `source`.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            offset: 0,
            line: 1,
            column: 1,
        }
    }

    /// Create a cursor at byte `offset` of `source`, with line and column
    /// computed from the text before it. `offset` must be a char boundary.
    pub fn at(source: &'src str, offset: usize) -> Self {
        let mut cursor = Self::new(source);
        if source.is_char_boundary(offset) {
            cursor.advance_bytes(offset);
        }
        cursor
    }

    #[inline]
    pub fn source(&self) -> &'src str {
        self.source
    }

    #[inline]
    pub fn offset(&self) -> u32 {
        self.offset
    }

    #[inline]
    pub fn line(&self) -> u32 {
        self.line
    }

    #[inline]
    pub fn column(&self) -> u32 {
        self.column
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.rest.is_empty()
    }

    #[inline]
    pub fn peek(&self) -> Option<char> {
        self.rest.chars().next()
    }

    /// Peek at the nth character ahead (0 = current).
    #[inline]
    pub fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    #[inline]
    pub fn check(&self, f: impl Fn(char) -> bool) -> bool {
        self.peek().is_some_and(f)
    }

    /// Consume the current character, updating line and column.
    pub fn advance(&mut self) -> Option<char> {
        let ch = self.rest.chars().next()?;
        let len = ch.len_utf8();
        self.rest = &self.rest[len..];
        self.offset += len as u32;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += len as u32;
        }
        Some(ch)
    }

    /// Advance by `n` bytes. `n` must land on a char boundary.
    pub fn advance_bytes(&mut self, n: usize) {
        let target = self.offset as usize + n.min(self.rest.len());
        while (self.offset as usize) < target {
            if self.advance().is_none() {
                break;
            }
        }
    }

    /// Consume if the current character matches.
    #[inline]
    pub fn eat(&mut self, ch: char) -> bool {
        if self.peek() == Some(ch) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume characters while the predicate matches and return them.
    pub fn eat_while(&mut self, f: impl Fn(char) -> bool) -> &'src str {
        let start = self.offset;
        while self.check(&f) {
            self.advance();
        }
        self.slice_from(start)
    }

    pub fn skip_whitespace(&mut self) {
        self.eat_while(char::is_whitespace);
    }

    #[inline]
    pub fn slice_from(&self, start: u32) -> &'src str {
        &self.source[start as usize..self.offset as usize]
    }

    #[inline]
    pub fn mark(&self) -> Mark {
        Mark {
            offset: self.offset,
            line: self.line,
            column: self.column,
        }
    }

    /// Span from `mark` to the current position.
    pub fn span_from(&self, mark: Mark) -> Span {
        Span::new(mark.line, mark.column, self.offset - mark.offset)
    }

    /// Zero-length span at the current position.
    pub fn here(&self) -> Span {
        Span::point(self.line, self.column)
    }

    /// Description of the next character for error messages.
    pub fn describe_next(&self) -> String {
        match self.peek() {
            Some(ch) => format!("'{}'", ch),
            None => "end of text".to_string(),
        }
    }
}

/// Check if a character can start an identifier.
#[inline]
pub fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

/// Check if a character can continue an identifier.
#[inline]
pub fn is_ident_continue(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}
