//! Core types for the decorum decoration engine.
//!
//! This crate holds everything the parser, the decorator registry, the
//! policies and the runtime share:
//!
//! - the value model ([`Dynamic`]) and object heap,
//! - callables with declared calling conventions ([`Callable`], [`Signature`]),
//! - the [`Host`] seam a callable runs against,
//! - member kinds, class definitions and instances with their
//!   per-instance [`MemberRegistry`],
//! - the [`DecorationContext`] handed to decorators,
//! - access paths for the dispatcher,
//! - the unified error hierarchy.

pub mod class;
pub mod context;
pub mod convert;
pub mod error;
pub mod instance;
pub mod kind;
pub mod path;
pub mod runtime;
pub mod span;
pub mod spec;

pub use class::{ClassDef, MemberMetadata, MethodDef, PropertyDef};
pub use context::{DecorationContext, InstanceId, SourceInstance};
pub use convert::{FromDynamic, IntoDynamic};
pub use error::{
    ContractViolation, ConversionError, DecorationError, DecorumError, DispatchError,
    LiteralError, NativeError,
};
pub use instance::{Instance, MemberRegistry};
pub use kind::{MemberKind, MemberKinds, Semantics};
pub use path::{AccessPath, Segment};
pub use runtime::{
    Arity, CallContext, Callable, DeferredTask, DetachedHost, Dynamic, Host, NativeCallable,
    ObjectHandle, ObjectHeap, Signature, TimerId,
};
pub use span::Span;
pub use spec::{DecoratorSpec, ParsedAttribute, SpecArgs};
