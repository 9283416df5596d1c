//! Values, callables and the execution seam.
//!
//! ## Key Types
//!
//! - [`Dynamic`]: Runtime value flowing through accessors and methods
//! - [`Callable`]: Type-erased callable with a declared [`Signature`]
//! - [`CallContext`]: Bridge between a caller and a native Rust callable
//! - [`ObjectHeap`]: Arena for reference-semantics instances
//! - [`Host`]: Services (heap, timers, scopes, nested dispatch) a call runs against

mod call_context;
mod callable;
mod dynamic;
mod host;
mod object_heap;

pub use call_context::CallContext;
pub use callable::{Arity, Callable, NativeCallable, Signature};
pub use dynamic::Dynamic;
pub use host::{DeferredTask, DetachedHost, Host, TimerId};
pub use object_heap::{ObjectHandle, ObjectHeap};
