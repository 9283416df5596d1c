//! Runtime value type.

use std::collections::BTreeMap;
use std::fmt;

use super::{Callable, ObjectHandle};
use crate::Instance;

/// A dynamic value flowing through accessors, setters and method calls.
///
/// Instances come in two flavors matching the class semantics:
/// [`Dynamic::Object`] is a handle into the object heap (reference
/// semantics, mutated in place) and [`Dynamic::Instance`] carries the whole
/// instance by value (copied on assignment).
#[derive(Clone, Default)]
pub enum Dynamic {
    /// No value
    #[default]
    Void,
    /// Explicit null
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Ordered list; a non-empty list of instances is an aggregate receiver
    List(Vec<Dynamic>),
    /// Plain named fields, value semantics
    Record(BTreeMap<String, Dynamic>),
    /// Handle to a reference-semantics instance
    Object(ObjectHandle),
    /// A value-semantics instance
    Instance(Box<Instance>),
    /// A callable value
    Function(Callable),
}

impl Dynamic {
    /// Get a human-readable name for this value's type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Dynamic::Void => "void",
            Dynamic::Null => "null",
            Dynamic::Bool(_) => "bool",
            Dynamic::Int(_) => "int",
            Dynamic::Float(_) => "float",
            Dynamic::String(_) => "string",
            Dynamic::List(_) => "list",
            Dynamic::Record(_) => "record",
            Dynamic::Object(_) => "object",
            Dynamic::Instance(_) => "instance",
            Dynamic::Function(_) => "function",
        }
    }

    /// True for a single instance of either semantics.
    pub fn is_instance(&self) -> bool {
        matches!(self, Dynamic::Object(_) | Dynamic::Instance(_))
    }

    /// True for values that can be mutated in place through a copy of
    /// themselves, i.e. heap handles.
    pub fn has_reference_semantics(&self) -> bool {
        matches!(self, Dynamic::Object(_))
    }

    pub fn as_handle(&self) -> Option<ObjectHandle> {
        match self {
            Dynamic::Object(handle) => Some(*handle),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Dynamic::String(s) => Some(s),
            _ => None,
        }
    }

    /// The instances this value denotes as a receiver: one for a single
    /// instance, N for a non-empty list made only of instances, none for
    /// anything else.
    pub fn receiver_instances(&self) -> Option<&[Dynamic]> {
        match self {
            Dynamic::Object(_) | Dynamic::Instance(_) => Some(std::slice::from_ref(self)),
            Dynamic::List(items) if !items.is_empty() && items.iter().all(Dynamic::is_instance) => {
                Some(items)
            }
            _ => None,
        }
    }

    /// Build a list value.
    pub fn list<I: IntoIterator<Item = Dynamic>>(items: I) -> Self {
        Dynamic::List(items.into_iter().collect())
    }

    /// Build a record value from name/value pairs.
    pub fn record<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Dynamic)>,
    {
        Dynamic::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl fmt::Debug for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dynamic::Void => write!(f, "Void"),
            Dynamic::Null => write!(f, "Null"),
            Dynamic::Bool(v) => write!(f, "Bool({})", v),
            Dynamic::Int(v) => write!(f, "Int({})", v),
            Dynamic::Float(v) => write!(f, "Float({})", v),
            Dynamic::String(s) => write!(f, "String({:?})", s),
            Dynamic::List(items) => f.debug_tuple("List").field(items).finish(),
            Dynamic::Record(fields) => f.debug_tuple("Record").field(fields).finish(),
            Dynamic::Object(h) => write!(f, "Object({:?})", h),
            Dynamic::Instance(i) => write!(f, "Instance({}#{})", i.class_name(), i.id().0),
            Dynamic::Function(c) => write!(f, "Function({})", c.name()),
        }
    }
}

impl PartialEq for Dynamic {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Dynamic::Void, Dynamic::Void) => true,
            (Dynamic::Null, Dynamic::Null) => true,
            (Dynamic::Bool(a), Dynamic::Bool(b)) => a == b,
            (Dynamic::Int(a), Dynamic::Int(b)) => a == b,
            (Dynamic::Float(a), Dynamic::Float(b)) => a == b,
            (Dynamic::String(a), Dynamic::String(b)) => a == b,
            (Dynamic::List(a), Dynamic::List(b)) => a == b,
            (Dynamic::Record(a), Dynamic::Record(b)) => a == b,
            (Dynamic::Object(a), Dynamic::Object(b)) => a == b,
            // Value instances compare by identity and state, not by decorations
            (Dynamic::Instance(a), Dynamic::Instance(b)) => {
                a.id() == b.id() && a.fields() == b.fields()
            }
            (Dynamic::Function(a), Dynamic::Function(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}
