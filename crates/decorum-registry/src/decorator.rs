//! The decorator contract.
//!
//! A decorator takes the callable it wraps, the shared
//! [`DecorationContext`] and its declared extra arguments, and returns
//! exactly one value: the replacement callable. The builder checks every
//! part of that contract, so implementations are free to return anything;
//! a broken decorator is rejected at decoration time rather than at call
//! time.

use std::fmt;
use std::sync::Arc;

use decorum_core::{Arity, Callable, DecorationContext, Dynamic, NativeError};

/// A decorator implementation.
pub trait DecoratorFn: Send + Sync {
    /// Accepted parameter count, counting the wrapped callable and the
    /// context. Must accept `2 + args.len()` for an application to be valid.
    fn params(&self) -> Arity;

    /// Produce the wrapper. A conforming decorator returns exactly one
    /// [`Dynamic::Function`].
    fn apply(
        &self,
        wrapped: Callable,
        ctx: &Arc<DecorationContext>,
        args: &[Dynamic],
    ) -> Result<Vec<Dynamic>, NativeError>;
}

struct FnDecorator<F> {
    params: Arity,
    f: F,
}

impl<F> DecoratorFn for FnDecorator<F>
where
    F: Fn(Callable, &Arc<DecorationContext>, &[Dynamic]) -> Result<Vec<Dynamic>, NativeError>
        + Send
        + Sync,
{
    fn params(&self) -> Arity {
        self.params
    }

    fn apply(
        &self,
        wrapped: Callable,
        ctx: &Arc<DecorationContext>,
        args: &[Dynamic],
    ) -> Result<Vec<Dynamic>, NativeError> {
        (self.f)(wrapped, ctx, args)
    }
}

/// A decorator value: one implementation, or an ordered preset of
/// decorators that is expanded element-wise wherever it is used.
#[derive(Clone)]
pub enum Decorator {
    Single {
        name: Arc<str>,
        inner: Arc<dyn DecoratorFn>,
    },
    List(Vec<Decorator>),
}

impl Decorator {
    /// Wrap a raw implementation that reports its own outputs.
    pub fn new<F>(name: impl Into<Arc<str>>, params: Arity, f: F) -> Self
    where
        F: Fn(Callable, &Arc<DecorationContext>, &[Dynamic]) -> Result<Vec<Dynamic>, NativeError>
            + Send
            + Sync
            + 'static,
    {
        Decorator::Single {
            name: name.into(),
            inner: Arc::new(FnDecorator { params, f }),
        }
    }

    /// A decorator that always produces one callable and accepts any number
    /// of extra arguments.
    pub fn simple<F>(name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: Fn(Callable, &Arc<DecorationContext>, &[Dynamic]) -> Result<Callable, NativeError>
            + Send
            + Sync
            + 'static,
    {
        Self::wrapper(name, Arity::AtLeast(2), f)
    }

    /// A decorator that always produces one callable, with an explicit
    /// parameter arity (`2 + extra arguments`).
    pub fn wrapper<F>(name: impl Into<Arc<str>>, params: Arity, f: F) -> Self
    where
        F: Fn(Callable, &Arc<DecorationContext>, &[Dynamic]) -> Result<Callable, NativeError>
            + Send
            + Sync
            + 'static,
    {
        Self::new(name, params, move |wrapped, ctx, args| {
            f(wrapped, ctx, args).map(|callable| vec![Dynamic::Function(callable)])
        })
    }

    pub fn preset<I: IntoIterator<Item = Decorator>>(items: I) -> Self {
        Decorator::List(items.into_iter().collect())
    }

    /// Name for messages. Presets list their members.
    pub fn name(&self) -> String {
        match self {
            Decorator::Single { name, .. } => name.to_string(),
            Decorator::List(items) => {
                let names: Vec<String> = items.iter().map(Decorator::name).collect();
                format!("[{}]", names.join(", "))
            }
        }
    }

    /// The single decorators in source order, presets expanded recursively.
    pub fn leaves(&self) -> Vec<(Arc<str>, Arc<dyn DecoratorFn>)> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves(&self, out: &mut Vec<(Arc<str>, Arc<dyn DecoratorFn>)>) {
        match self {
            Decorator::Single { name, inner } => out.push((Arc::clone(name), Arc::clone(inner))),
            Decorator::List(items) => {
                for item in items {
                    item.collect_leaves(out);
                }
            }
        }
    }
}

impl fmt::Debug for Decorator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decorator::Single { name, inner } => f
                .debug_struct("Decorator")
                .field("name", name)
                .field("params", &inner.params())
                .finish(),
            Decorator::List(items) => f.debug_tuple("Preset").field(items).finish(),
        }
    }
}
