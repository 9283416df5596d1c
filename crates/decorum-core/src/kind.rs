//! Member kinds and class semantics.

use std::fmt;

use bitflags::bitflags;

/// Which accessor of a member a decoration applies to.
///
/// The kind selects both the attribute keyword that declares the decoration
/// and the calling convention the composed chain must satisfy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MemberKind {
    /// Property read: `fn(receiver) -> value...`
    Getter,
    /// Property write: `fn(receiver, value)`, returning the receiver for value classes.
    Setter,
    /// Method call: any signature, receiver first.
    Method,
}

impl MemberKind {
    /// All kinds, in the order construction scans them.
    pub const ALL: [MemberKind; 3] = [MemberKind::Getter, MemberKind::Setter, MemberKind::Method];

    /// The metadata keyword that declares decorators for this kind.
    pub fn keyword(self) -> &'static str {
        match self {
            MemberKind::Getter => "GetDecorator",
            MemberKind::Setter => "SetDecorator",
            MemberKind::Method => "Decorator",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MemberKind::Getter => "getter",
            MemberKind::Setter => "setter",
            MemberKind::Method => "method",
        }
    }

    /// The flag for this kind in a [`MemberKinds`] set.
    pub fn flag(self) -> MemberKinds {
        match self {
            MemberKind::Getter => MemberKinds::GETTER,
            MemberKind::Setter => MemberKinds::SETTER,
            MemberKind::Method => MemberKinds::METHOD,
        }
    }
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

bitflags! {
    /// A set of member kinds, e.g. the kinds a member is decorated for.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MemberKinds: u8 {
        const GETTER = 1 << 0;
        const SETTER = 1 << 1;
        const METHOD = 1 << 2;
        const PROPERTY = Self::GETTER.bits() | Self::SETTER.bits();
    }
}

/// Copy behavior of a class's instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Semantics {
    /// Instances live in the object heap and are shared through handles.
    /// Setters mutate in place and return nothing.
    #[default]
    Reference,
    /// Instances are copied on assignment. Setters return the updated
    /// instance, which replaces the caller's binding.
    Value,
}

impl Semantics {
    /// Number of outputs a setter chain must produce for this semantics.
    pub fn setter_outputs(self) -> usize {
        match self {
            Semantics::Reference => 0,
            Semantics::Value => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keywords_are_distinct() {
        assert_eq!(MemberKind::Getter.keyword(), "GetDecorator");
        assert_eq!(MemberKind::Setter.keyword(), "SetDecorator");
        assert_eq!(MemberKind::Method.keyword(), "Decorator");
    }

    #[test]
    fn kind_flags() {
        let property = MemberKind::Getter.flag() | MemberKind::Setter.flag();
        assert_eq!(property, MemberKinds::PROPERTY);
        assert!(!property.contains(MemberKind::Method.flag()));
    }

    #[test]
    fn setter_output_arity() {
        assert_eq!(Semantics::Reference.setter_outputs(), 0);
        assert_eq!(Semantics::Value.setter_outputs(), 1);
    }
}
