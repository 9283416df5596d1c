//! The record handed to every decorator of a chain.

use std::fmt;
use std::sync::Arc;

use crate::{MemberKind, ObjectHandle};

/// Process-unique identity of a constructed instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstanceId(pub u64);

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The instance a chain was installed on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceInstance {
    pub id: InstanceId,
    pub class: Arc<str>,
    /// Heap handle, for reference-semantics classes only. Value instances
    /// are copied on assignment, so a decorator cannot reach "the" instance.
    pub handle: Option<ObjectHandle>,
}

/// {kind, member, source instance}, created once per `decorate` call and
/// shared by every decorator in the chain and every later invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecorationContext {
    pub kind: MemberKind,
    pub member: Arc<str>,
    pub source: SourceInstance,
}

impl DecorationContext {
    pub fn new(kind: MemberKind, member: impl Into<Arc<str>>, source: SourceInstance) -> Arc<Self> {
        Arc::new(Self {
            kind,
            member: member.into(),
            source,
        })
    }

    pub fn class(&self) -> &str {
        &self.source.class
    }

    /// `Class.member`, for log lines and error messages.
    pub fn qualified_member(&self) -> String {
        format!("{}.{}", self.source.class, self.member)
    }
}

impl fmt::Display for DecorationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}.{} on {}",
            self.kind, self.source.class, self.member, self.source.id
        )
    }
}
