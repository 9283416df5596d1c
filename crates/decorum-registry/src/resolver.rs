//! Decorator references to decorator values with evaluated arguments.

use decorum_core::{DecorationError, DecoratorSpec, Dynamic, MemberKind, SpecArgs};
use decorum_parser::evaluate_arguments;

use crate::{Decorator, DecoratorNamespace};

/// A decorator ready to be applied.
#[derive(Debug, Clone)]
pub struct ResolvedDecorator {
    /// The name it was referenced by, or the decorator's own name.
    pub name: String,
    pub decorator: Decorator,
    pub args: Vec<Dynamic>,
}

impl ResolvedDecorator {
    /// A decorator value supplied directly, bypassing the namespace.
    pub fn direct(decorator: Decorator, args: Vec<Dynamic>) -> Self {
        Self {
            name: decorator.name(),
            decorator,
            args,
        }
    }
}

/// Resolves specs against a namespace.
pub struct DecoratorResolver<'ns> {
    namespace: &'ns DecoratorNamespace,
}

impl<'ns> DecoratorResolver<'ns> {
    pub fn new(namespace: &'ns DecoratorNamespace) -> Self {
        Self { namespace }
    }

    /// Resolve one spec for `member`'s `kind` decoration.
    ///
    /// Unknown names fail with [`DecorationError::Resolution`]; argument text
    /// that is not a literal list fails with
    /// [`DecorationError::InvalidArguments`].
    pub fn resolve(
        &self,
        kind: MemberKind,
        member: &str,
        spec: &DecoratorSpec,
    ) -> Result<ResolvedDecorator, DecorationError> {
        let decorator = self.lookup(kind, member, &spec.name)?;
        let args = match &spec.args {
            SpecArgs::Values(values) => values.clone(),
            SpecArgs::Text(text) => {
                evaluate_arguments(text).map_err(|source| DecorationError::InvalidArguments {
                    decorator: spec.name.clone(),
                    kind,
                    member: member.to_string(),
                    source,
                })?
            }
        };
        Ok(ResolvedDecorator {
            name: spec.name.clone(),
            decorator: decorator.clone(),
            args,
        })
    }

    /// Resolve every spec, in order, stopping at the first failure.
    pub fn resolve_all(
        &self,
        kind: MemberKind,
        member: &str,
        specs: &[DecoratorSpec],
    ) -> Result<Vec<ResolvedDecorator>, DecorationError> {
        specs.iter().map(|spec| self.resolve(kind, member, spec)).collect()
    }

    /// Look up a name only.
    pub fn lookup(
        &self,
        kind: MemberKind,
        member: &str,
        name: &str,
    ) -> Result<&'ns Decorator, DecorationError> {
        self.namespace.get(name).ok_or_else(|| DecorationError::Resolution {
            name: name.to_string(),
            kind,
            member: member.to_string(),
        })
    }
}
