//! Class registration.
//!
//! # Example
//!
//! ```ignore
//! use decorum::{ClassBuilder, Semantics, Signature, Arity};
//!
//! let account = ClassBuilder::reference("Account")
//!     .property_with("balance", 0i64, "GetDecorator = @countCalls")
//!     .method_with(
//!         "close",
//!         Signature::method(0, Arity::Exact(0)),
//!         "Decorator = [@oneShot, @delayedExec(3)]",
//!         |ctx: &mut CallContext<'_>| Ok(()),
//!     )
//!     .build()?;
//! runtime.register_class(account)?;
//! ```

use decorum_core::convert::IntoDynamic;
use decorum_core::{
    Callable, ClassDef, DecorationError, MemberMetadata, MethodDef, NativeCallable, PropertyDef,
    Semantics, Signature,
};

/// Builder for a [`ClassDef`].
///
/// Member errors (duplicate names) are kept until [`ClassBuilder::build`],
/// which reports the first one.
#[derive(Debug)]
pub struct ClassBuilder {
    def: ClassDef,
    error: Option<DecorationError>,
}

impl ClassBuilder {
    pub fn new(name: &str, semantics: Semantics) -> Self {
        Self {
            def: ClassDef::new(name, semantics),
            error: None,
        }
    }

    /// A class whose instances live in the object heap.
    pub fn reference(name: &str) -> Self {
        Self::new(name, Semantics::Reference)
    }

    /// A class whose instances are copied on assignment.
    pub fn value(name: &str) -> Self {
        Self::new(name, Semantics::Value)
    }

    pub fn property(self, name: &str, default: impl IntoDynamic) -> Self {
        self.property_with(name, default, MemberMetadata::none())
    }

    /// A property with decoration metadata (attribute text or descriptors).
    pub fn property_with(
        mut self,
        name: &str,
        default: impl IntoDynamic,
        metadata: impl Into<MemberMetadata>,
    ) -> Self {
        let result = self.def.add_property(PropertyDef {
            name: name.into(),
            default: default.into_dynamic(),
            metadata: metadata.into(),
        });
        self.record(result);
        self
    }

    /// A method; argument 0 of `body` is the receiver.
    pub fn method<F>(self, name: &str, signature: Signature, body: F) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        self.method_with(name, signature, MemberMetadata::none(), body)
    }

    pub fn method_with<F>(
        mut self,
        name: &str,
        signature: Signature,
        metadata: impl Into<MemberMetadata>,
        body: F,
    ) -> Self
    where
        F: NativeCallable + Send + Sync + 'static,
    {
        let result = self.def.add_method(MethodDef {
            name: name.into(),
            body: Callable::new(name, signature, body),
            metadata: metadata.into(),
        });
        self.record(result);
        self
    }

    fn record(&mut self, result: Result<(), DecorationError>) {
        if let Err(error) = result
            && self.error.is_none()
        {
            self.error = Some(error);
        }
    }

    pub fn build(self) -> Result<ClassDef, DecorationError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.def),
        }
    }
}

impl From<ClassDef> for ClassBuilder {
    fn from(def: ClassDef) -> Self {
        Self { def, error: None }
    }
}
