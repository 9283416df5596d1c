//! Access paths: the chained member/call/index expressions the dispatcher
//! interprets.

use std::fmt;

use crate::Dynamic;

/// One step of an access expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Segment {
    /// `.name`
    Field(String),
    /// `(args...)`
    Call(Vec<Dynamic>),
    /// `[i]`
    Index(usize),
}

impl Segment {
    pub fn field(name: impl Into<String>) -> Self {
        Segment::Field(name.into())
    }

    pub fn call<I: IntoIterator<Item = Dynamic>>(args: I) -> Self {
        Segment::Call(args.into_iter().collect())
    }

    pub fn index(i: usize) -> Self {
        Segment::Index(i)
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => write!(f, ".{}", name),
            Segment::Call(args) => write!(f, "call with {} argument(s)", args.len()),
            Segment::Index(i) => write!(f, "[{}]", i),
        }
    }
}

/// Builder for a segment list.
///
/// ```ignore
/// let path = AccessPath::new().field("inner").field("value").build();
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessPath {
    segments: Vec<Segment>,
}

impl AccessPath {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>) -> Self {
        self.segments.push(Segment::field(name));
        self
    }

    pub fn call<I: IntoIterator<Item = Dynamic>>(mut self, args: I) -> Self {
        self.segments.push(Segment::call(args));
        self
    }

    pub fn index(mut self, i: usize) -> Self {
        self.segments.push(Segment::Index(i));
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn build(self) -> Vec<Segment> {
        self.segments
    }
}

impl From<AccessPath> for Vec<Segment> {
    fn from(path: AccessPath) -> Self {
        path.segments
    }
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for segment in &self.segments {
            match segment {
                Segment::Call(args) => write!(f, "({})", args.len())?,
                other => write!(f, "{}", other)?,
            }
        }
        Ok(())
    }
}
