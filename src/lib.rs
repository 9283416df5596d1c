//! decorum: declarative decoration of class members.
//!
//! Getters, setters and methods of registered classes carry decorator
//! chains, declared in member metadata or installed later with
//! [`Runtime::decorate`]. Every access to an instance goes through the
//! [`Runtime`] dispatcher, which routes it to the installed chain or to
//! default access.
//!
//! ```ignore
//! use decorum::prelude::*;
//!
//! let mut runtime = Runtime::with_standard_policies();
//! runtime.register_class(
//!     ClassBuilder::reference("Account")
//!         .property_with("balance", 0i64, "GetDecorator = @countCalls")
//!         .build()?,
//! )?;
//! let account = runtime.construct("Account", [("balance", Dynamic::Int(10))])?;
//! assert_eq!(runtime.get(&account, "balance")?, Dynamic::Int(10));
//! ```

mod class_builder;
mod config;
mod decorate;
mod dispatch;
mod runtime;
mod scheduler;

pub use class_builder::ClassBuilder;
pub use config::{DEFAULT_MAX_DISPATCH_DEPTH, RuntimeConfig};
pub use decorate::DecoratorRef;
pub use runtime::Runtime;
pub use scheduler::{Clock, ManualClock, SystemClock};

pub use decorum_core::{
    AccessPath, Arity, CallContext, Callable, ClassDef, ContractViolation, DecorationContext,
    DecorationError, DecoratorSpec, DecorumError, DispatchError, Dynamic, Host, Instance,
    MemberKind, MemberMetadata, NativeError, Segment, Semantics, Signature,
};
pub use decorum_modules::{Observers, standard_namespace, standard_namespace_with};
pub use decorum_registry::{Decorator, DecoratorNamespace};

/// Everything needed to register classes, decorate members and dispatch.
pub mod prelude {
    pub use crate::{ClassBuilder, DecoratorRef, ManualClock, Runtime, RuntimeConfig};
    pub use decorum_core::convert::{FromDynamic, IntoDynamic};
    pub use decorum_core::{
        AccessPath, Arity, CallContext, Callable, DecorationError, DecorumError, DispatchError,
        Dynamic, Host, MemberKind, NativeError, Segment, Semantics, Signature,
    };
    pub use decorum_modules::Observers;
    pub use decorum_registry::{Decorator, DecoratorNamespace};
}
