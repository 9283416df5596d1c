//! Composition of resolved decorators around a base accessor.
//!
//! For decorators `[d1, ..., dn]` and base `b` the chain is
//! `d1(d2(...dn(b)))`: the rightmost wraps the base first and the leftmost
//! ends up outermost, so it is entered first at call time. Presets are
//! expanded in place before composing.
//!
//! The partially built chain is checked against the kind's calling
//! convention after every wrap step:
//!
//! | kind   | parameters | outputs                              |
//! |--------|------------|--------------------------------------|
//! | getter | exactly 1  | any                                  |
//! | setter | exactly 2  | 0 (reference) or exactly 1 (value)   |
//! | method | any        | any                                  |
//!
//! A failure at any step discards the whole chain.

use std::sync::Arc;

use decorum_core::{
    Callable, ContractViolation, DecorationContext, DecorationError, Dynamic, MemberKind,
    Semantics, Signature,
};

use crate::ResolvedDecorator;

/// Check a chain's declared signature against the contract for `kind`.
pub fn validate_chain(
    kind: MemberKind,
    semantics: Semantics,
    signature: Signature,
) -> Result<(), ContractViolation> {
    let (params, outputs) = match kind {
        MemberKind::Getter => (Some(1), None),
        MemberKind::Setter => (Some(2), Some(semantics.setter_outputs())),
        MemberKind::Method => (None, None),
    };

    if let Some(expected) = params
        && !signature.params.is_exactly(expected)
    {
        return Err(ContractViolation::ChainParams {
            kind,
            expected,
            actual: signature.params,
        });
    }
    if let Some(expected) = outputs
        && !signature.outputs.is_exactly(expected)
    {
        return Err(ContractViolation::ChainOutputs {
            kind,
            expected,
            actual: signature.outputs,
        });
    }
    Ok(())
}

/// Builds one chain for one (kind, member) of one instance.
pub struct ChainBuilder {
    ctx: Arc<DecorationContext>,
    semantics: Semantics,
}

impl ChainBuilder {
    pub fn new(ctx: Arc<DecorationContext>, semantics: Semantics) -> Self {
        Self { ctx, semantics }
    }

    pub fn context(&self) -> &Arc<DecorationContext> {
        &self.ctx
    }

    /// Compose `decorators` (source order) around `base`.
    ///
    /// Steps are numbered from 1 for the innermost wrap. No decorators
    /// yields the base itself.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn build(
        &self,
        base: Callable,
        decorators: &[ResolvedDecorator],
    ) -> Result<Callable, DecorationError> {
        let steps: Vec<_> = decorators
            .iter()
            .flat_map(|resolved| {
                resolved
                    .decorator
                    .leaves()
                    .into_iter()
                    .map(move |(name, inner)| (name, inner, resolved.args.as_slice()))
            })
            .collect();

        let mut chain = base;
        for (index, (name, decorator, args)) in steps.into_iter().rev().enumerate() {
            let step = index + 1;
            let violation = |reason: ContractViolation| DecorationError::ContractViolation {
                kind: self.ctx.kind,
                member: self.ctx.member.to_string(),
                step,
                decorator: name.to_string(),
                reason,
            };

            let required = 2 + args.len();
            let params = decorator.params();
            if !params.accepts(required) {
                return Err(violation(ContractViolation::DecoratorParams {
                    params,
                    required,
                    extra: args.len(),
                }));
            }

            let outputs = decorator.apply(chain, &self.ctx, args).map_err(|e| {
                violation(ContractViolation::ApplyFailed {
                    message: e.to_string(),
                })
            })?;

            chain = match <[Dynamic; 1]>::try_from(outputs) {
                Ok([Dynamic::Function(callable)]) => callable,
                Ok([other]) => {
                    return Err(violation(ContractViolation::NotCallable {
                        type_name: other.type_name(),
                    }));
                }
                Err(outputs) => {
                    return Err(violation(ContractViolation::OutputCount {
                        count: outputs.len(),
                    }));
                }
            };

            validate_chain(self.ctx.kind, self.semantics, chain.signature())
                .map_err(violation)?;
            tracing::trace!(
                step,
                decorator = %name,
                member = %self.ctx.member,
                kind = %self.ctx.kind,
                "wrapped chain"
            );
        }
        Ok(chain)
    }
}
