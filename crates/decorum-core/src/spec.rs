//! Decorator references as they come out of member metadata.

use crate::{Dynamic, MemberKind, Span};

/// Arguments of one decorator reference.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecArgs {
    /// Raw text between the parentheses of `@name(...)`, not yet evaluated.
    Text(String),
    /// Already-evaluated values from a structured descriptor.
    Values(Vec<Dynamic>),
}

impl SpecArgs {
    pub fn none() -> Self {
        SpecArgs::Values(Vec::new())
    }

    /// True for empty text or an empty value list.
    pub fn is_empty(&self) -> bool {
        match self {
            SpecArgs::Text(text) => text.trim().is_empty(),
            SpecArgs::Values(values) => values.is_empty(),
        }
    }
}

impl Default for SpecArgs {
    fn default() -> Self {
        SpecArgs::none()
    }
}

/// A decorator reference: a name to resolve plus its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct DecoratorSpec {
    pub name: String,
    pub args: SpecArgs,
    /// Where the reference appeared in the metadata text, if it came from text.
    pub span: Option<Span>,
}

impl DecoratorSpec {
    /// A reference parsed from attribute text.
    pub fn parsed(name: impl Into<String>, args: impl Into<String>, span: Span) -> Self {
        Self {
            name: name.into(),
            args: SpecArgs::Text(args.into()),
            span: Some(span),
        }
    }

    /// A structured descriptor with evaluated argument values.
    pub fn with_values<I>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = Dynamic>,
    {
        Self {
            name: name.into(),
            args: SpecArgs::Values(values.into_iter().collect()),
            span: None,
        }
    }

    /// A structured descriptor with no arguments.
    pub fn named(name: impl Into<String>) -> Self {
        Self::with_values(name, [])
    }
}

/// The decorator expression found for one member and kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedAttribute {
    pub kind: MemberKind,
    /// Source order.
    pub specs: Vec<DecoratorSpec>,
}

impl ParsedAttribute {
    pub fn new(kind: MemberKind, specs: Vec<DecoratorSpec>) -> Self {
        Self { kind, specs }
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.specs.iter().map(|spec| spec.name.as_str())
    }
}
