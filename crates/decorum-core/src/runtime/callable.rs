//! Callable values and their calling conventions.

use std::fmt;
use std::sync::Arc;

use super::{CallContext, Dynamic, Host};
use crate::NativeError;

/// How many parameters a callable accepts, or how many outputs it produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arity {
    Exact(usize),
    AtLeast(usize),
    Any,
}

impl Arity {
    /// Whether a count of `n` satisfies this arity.
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exact(expected) => n == expected,
            Arity::AtLeast(min) => n >= min,
            Arity::Any => true,
        }
    }

    pub fn is_exactly(self, n: usize) -> bool {
        self == Arity::Exact(n)
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(n) => write!(f, "{}", n),
            Arity::AtLeast(n) => write!(f, "{} or more", n),
            Arity::Any => write!(f, "any number of"),
        }
    }
}

/// Declared calling convention of a [`Callable`]: parameter and output arity.
///
/// Parameters count the receiver for accessors and methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    pub params: Arity,
    pub outputs: Arity,
}

impl Signature {
    pub const fn new(params: Arity, outputs: Arity) -> Self {
        Self { params, outputs }
    }

    /// `fn(receiver) -> value`
    pub const fn getter() -> Self {
        Self::new(Arity::Exact(1), Arity::Exact(1))
    }

    /// `fn(receiver, value)` producing `outputs` values.
    pub const fn setter(outputs: usize) -> Self {
        Self::new(Arity::Exact(2), Arity::Exact(outputs))
    }

    /// `fn(receiver, args...)` with exactly `args` extra arguments.
    pub const fn method(args: usize, outputs: Arity) -> Self {
        Self::new(Arity::Exact(args + 1), outputs)
    }

    pub const fn variadic() -> Self {
        Self::new(Arity::Any, Arity::Any)
    }
}

/// Trait for callable native functions.
///
/// The `call` method receives a [`CallContext`] that provides access to the
/// arguments and collects the outputs.
pub trait NativeCallable {
    fn call(&self, ctx: &mut CallContext<'_>) -> Result<(), NativeError>;
}

impl<F> NativeCallable for F
where
    F: Fn(&mut CallContext<'_>) -> Result<(), NativeError>,
{
    fn call(&self, ctx: &mut CallContext<'_>) -> Result<(), NativeError> {
        (self)(ctx)
    }
}

/// A type-erased, cheaply clonable callable.
///
/// Base accessors, method bodies and every decorated chain are `Callable`s.
/// Cloning shares the underlying implementation, so a chain copied out of a
/// registry is the same chain, with the same captured state.
#[derive(Clone)]
pub struct Callable {
    name: Arc<str>,
    signature: Signature,
    inner: Arc<dyn NativeCallable + Send + Sync>,
}

impl Callable {
    pub fn new<F>(name: impl Into<Arc<str>>, signature: Signature, f: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            signature,
            inner: Arc::new(f),
        }
    }

    /// Build a wrapper around `wrapped` that keeps its calling convention.
    pub fn wrapping<F>(wrapped: &Callable, name: impl Into<Arc<str>>, f: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        Self::new(name, wrapped.signature, f)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn signature(&self) -> Signature {
        self.signature
    }

    /// Same implementation, different declared convention.
    pub fn with_signature(mut self, signature: Signature) -> Self {
        self.signature = signature;
        self
    }

    /// Invoke with `args`, asking for `nargout` outputs.
    ///
    /// The declared signature is enforced on both sides of the call.
    pub fn call(
        &self,
        host: &mut dyn Host,
        args: Vec<Dynamic>,
        nargout: usize,
    ) -> Result<Vec<Dynamic>, NativeError> {
        if !self.signature.params.accepts(args.len()) {
            return Err(NativeError::ArityMismatch {
                callable: self.name.to_string(),
                expected: self.signature.params,
                got: args.len(),
            });
        }

        let mut ctx = CallContext::new(args, nargout, host);
        self.inner.call(&mut ctx)?;
        let outputs = ctx.into_outputs();

        if !self.signature.outputs.accepts(outputs.len()) {
            return Err(NativeError::OutputMismatch {
                callable: self.name.to_string(),
                expected: self.signature.outputs,
                got: outputs.len(),
            });
        }
        Ok(outputs)
    }

    /// Whether both values share the same implementation.
    pub fn ptr_eq(&self, other: &Callable) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Callable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Callable")
            .field("name", &self.name)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}
