//! Installing decorator chains on instances.
//!
//! Every decoration composes around the member's base accessor, never
//! around a chain that is already installed, so decorating the same
//! (kind, member) twice leaves only the latest chain active.

use std::sync::Arc;

use decorum_core::{
    CallContext, Callable, ClassDef, DecorationContext, DecorationError, DecoratorSpec,
    DispatchError, Dynamic, Host, Instance, MemberKind, NativeError, Semantics, Signature,
    SourceInstance,
};
use decorum_registry::{ChainBuilder, Decorator, DecoratorResolver, ResolvedDecorator};

use crate::Runtime;

/// A decorator given to [`Runtime::decorate`]: a name resolved in the
/// runtime's namespace, or a decorator value used as is.
#[derive(Debug, Clone)]
pub enum DecoratorRef {
    Named(String),
    Value(Decorator),
}

impl From<&str> for DecoratorRef {
    fn from(name: &str) -> Self {
        DecoratorRef::Named(name.to_string())
    }
}

impl From<String> for DecoratorRef {
    fn from(name: String) -> Self {
        DecoratorRef::Named(name)
    }
}

impl From<Decorator> for DecoratorRef {
    fn from(decorator: Decorator) -> Self {
        DecoratorRef::Value(decorator)
    }
}

// =============================================================================
// Base accessors
// =============================================================================

/// `fn(receiver) -> field`
pub(crate) fn base_getter(member: Arc<str>) -> Callable {
    let name = format!("get.{member}");
    Callable::new(name, Signature::getter(), move |ctx: &mut CallContext<'_>| {
        let value = ctx.with_instance(|instance| {
            instance
                .field(&member)
                .cloned()
                .ok_or_else(|| DispatchError::NoSuchMember {
                    type_name: instance.class_name().to_string(),
                    member: member.to_string(),
                })
        })??;
        ctx.set_return(value);
        Ok(())
    })
}

/// `fn(receiver, value)`: in place for heap instances, returning the
/// updated copy for value instances.
pub(crate) fn base_setter(member: Arc<str>, semantics: Semantics) -> Callable {
    let name = format!("set.{member}");
    Callable::new(
        name,
        Signature::setter(semantics.setter_outputs()),
        move |ctx: &mut CallContext<'_>| {
            let value = ctx.arg_slot(1)?.clone();
            match ctx.receiver()?.clone() {
                Dynamic::Object(handle) => {
                    let instance = ctx
                        .host()
                        .heap_mut()
                        .instance_mut(handle)
                        .ok_or(NativeError::StaleHandle {
                            index: handle.index,
                        })?;
                    instance.set_field(&member, value)?;
                }
                Dynamic::Instance(mut instance) => {
                    instance.set_field(&member, value)?;
                    ctx.push_output(Dynamic::Instance(instance));
                }
                other => {
                    return Err(NativeError::invalid_receiver(format!(
                        "expected an instance, got {}",
                        other.type_name()
                    )));
                }
            }
            Ok(())
        },
    )
}

/// The method body, run inside its class scope.
pub(crate) fn base_method(class: Arc<str>, body: &Callable) -> Callable {
    let inner = body.clone();
    Callable::wrapping(body, body.name(), move |ctx: &mut CallContext<'_>| {
        ctx.host().enter_scope(Arc::clone(&class));
        let result = ctx.forward(&inner);
        ctx.host().exit_scope();
        ctx.set_outputs(result?);
        Ok(())
    })
}

/// Base accessor of `member` for `kind`, if `class` declares it.
pub(crate) fn base_accessor(class: &ClassDef, kind: MemberKind, member: &str) -> Option<Callable> {
    match kind {
        MemberKind::Getter => class.property(member).map(|p| base_getter(Arc::clone(&p.name))),
        MemberKind::Setter => class
            .property(member)
            .map(|p| base_setter(Arc::clone(&p.name), class.semantics())),
        MemberKind::Method => class
            .method(member)
            .map(|m| base_method(class.name_arc(), &m.body)),
    }
}

// =============================================================================
// Decoration
// =============================================================================

impl Runtime {
    /// Decorate `member` of `receiver` for `kind`.
    ///
    /// `args` holds one argument list per decorator, or is empty when no
    /// decorator takes arguments. The chain is composed around the base
    /// accessor and replaces any chain installed for (kind, member); an
    /// empty decorator list removes the decoration. Aggregate receivers
    /// decorate every instance, and either all of them are updated or none.
    ///
    /// Returns the receiver binding, which differs from the input for
    /// value-semantics instances.
    pub fn decorate<D, I>(
        &mut self,
        receiver: Dynamic,
        member: &str,
        kind: MemberKind,
        decorators: I,
        args: Vec<Vec<Dynamic>>,
    ) -> Result<Dynamic, DecorationError>
    where
        D: Into<DecoratorRef>,
        I: IntoIterator<Item = D>,
    {
        let decorators: Vec<DecoratorRef> = decorators.into_iter().map(Into::into).collect();
        if !args.is_empty() && args.len() != decorators.len() {
            return Err(DecorationError::ArgumentCountMismatch {
                decorators: decorators.len(),
                args: args.len(),
            });
        }

        let resolver = DecoratorResolver::new(self.namespace());
        let mut args = args.into_iter();
        let resolved = decorators
            .into_iter()
            .map(|decorator| {
                let values = args.next().unwrap_or_default();
                match decorator {
                    DecoratorRef::Named(name) => {
                        resolver.resolve(kind, member, &DecoratorSpec::with_values(name, values))
                    }
                    DecoratorRef::Value(decorator) => {
                        Ok(ResolvedDecorator::direct(decorator, values))
                    }
                }
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.install(receiver, member, kind, &resolved)
    }

    /// Resolve `specs` (attribute text or descriptors) and install them.
    pub(crate) fn decorate_specs(
        &mut self,
        receiver: Dynamic,
        member: &str,
        kind: MemberKind,
        specs: &[DecoratorSpec],
    ) -> Result<Dynamic, DecorationError> {
        let resolved = DecoratorResolver::new(self.namespace()).resolve_all(kind, member, specs)?;
        self.install(receiver, member, kind, &resolved)
    }

    fn install(
        &mut self,
        receiver: Dynamic,
        member: &str,
        kind: MemberKind,
        resolved: &[ResolvedDecorator],
    ) -> Result<Dynamic, DecorationError> {
        match receiver {
            Dynamic::List(items) if !items.is_empty() && items.iter().all(Dynamic::is_instance) => {
                let chains = items
                    .iter()
                    .map(|item| self.build_chain(item, member, kind, resolved))
                    .collect::<Result<Vec<_>, _>>()?;
                items
                    .into_iter()
                    .zip(chains)
                    .map(|(item, chain)| self.install_chain(item, member, kind, chain))
                    .collect::<Result<Vec<_>, _>>()
                    .map(Dynamic::List)
            }
            target => {
                let chain = self.build_chain(&target, member, kind, resolved)?;
                self.install_chain(target, member, kind, chain)
            }
        }
    }

    fn decoration_target<'a>(
        &'a self,
        target: &'a Dynamic,
    ) -> Result<&'a Instance, DecorationError> {
        match target {
            Dynamic::Object(handle) => self
                .heap()
                .instance(*handle)
                .ok_or(DecorationError::StaleHandle {
                    index: handle.index,
                }),
            Dynamic::Instance(instance) => Ok(instance.as_ref()),
            other => Err(DecorationError::NotAnInstance {
                type_name: other.type_name(),
            }),
        }
    }

    /// Compose the chain for one instance; `None` when there is nothing to
    /// compose.
    fn build_chain(
        &self,
        target: &Dynamic,
        member: &str,
        kind: MemberKind,
        resolved: &[ResolvedDecorator],
    ) -> Result<Option<Callable>, DecorationError> {
        let instance = self.decoration_target(target)?;
        let class = instance.class();
        let base = base_accessor(class, kind, member).ok_or_else(|| DecorationError::UnknownMember {
            class: class.name().to_string(),
            member: member.to_string(),
            kind,
        })?;
        if resolved.is_empty() {
            return Ok(None);
        }

        let ctx = DecorationContext::new(
            kind,
            member,
            SourceInstance {
                id: instance.id(),
                class: class.name_arc(),
                handle: target.as_handle(),
            },
        );
        ChainBuilder::new(ctx, class.semantics())
            .build(base, resolved)
            .map(Some)
    }

    fn install_chain(
        &mut self,
        target: Dynamic,
        member: &str,
        kind: MemberKind,
        chain: Option<Callable>,
    ) -> Result<Dynamic, DecorationError> {
        let update = |instance: &mut Instance| {
            let previous = match chain {
                Some(chain) => instance.decorations_mut().install(kind, member, chain),
                None => instance.decorations_mut().remove(kind, member),
            };
            tracing::debug!(
                class = instance.class_name(),
                instance = %instance.id(),
                member,
                %kind,
                replaced = previous.is_some(),
                decorated = ?instance.decorations().kinds_for(member),
                "installed chain"
            );
        };

        match target {
            Dynamic::Object(handle) => {
                let instance = self
                    .heap_mut()
                    .instance_mut(handle)
                    .ok_or(DecorationError::StaleHandle {
                        index: handle.index,
                    })?;
                update(instance);
                Ok(target)
            }
            Dynamic::Instance(mut instance) => {
                update(&mut instance);
                Ok(Dynamic::Instance(instance))
            }
            other => Err(DecorationError::NotAnInstance {
                type_name: other.type_name(),
            }),
        }
    }
}
