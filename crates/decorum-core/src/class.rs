//! Class definitions: the members a class declares and their metadata.

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::{
    Callable, DecorationError, DecoratorSpec, Dynamic, MemberKind, MemberKinds, Semantics,
};

/// Metadata attached to a property or method.
///
/// Decorations come either from free text (`GetDecorator = @trace`) or from
/// structured descriptors. For a given kind, descriptors win over text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MemberMetadata {
    pub text: Option<String>,
    pub descriptors: FxHashMap<MemberKind, Vec<DecoratorSpec>>,
}

impl MemberMetadata {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            descriptors: FxHashMap::default(),
        }
    }

    /// Add a structured descriptor list for `kind`.
    pub fn with_descriptors(mut self, kind: MemberKind, specs: Vec<DecoratorSpec>) -> Self {
        self.descriptors.insert(kind, specs);
        self
    }

    pub fn descriptors(&self, kind: MemberKind) -> Option<&[DecoratorSpec]> {
        self.descriptors.get(&kind).map(Vec::as_slice)
    }

    /// The kinds this metadata carries descriptors for.
    pub fn descriptor_kinds(&self) -> MemberKinds {
        self.descriptors
            .keys()
            .fold(MemberKinds::empty(), |acc, kind| acc | kind.flag())
    }

    pub fn is_empty(&self) -> bool {
        let blank = self.text.as_deref().is_none_or(|t| t.trim().is_empty());
        blank && self.descriptors.is_empty()
    }
}

impl From<&str> for MemberMetadata {
    fn from(text: &str) -> Self {
        MemberMetadata::text(text)
    }
}

impl From<String> for MemberMetadata {
    fn from(text: String) -> Self {
        MemberMetadata::text(text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    pub name: Arc<str>,
    pub default: Dynamic,
    pub metadata: MemberMetadata,
}

#[derive(Debug, Clone)]
pub struct MethodDef {
    pub name: Arc<str>,
    /// The undecorated body. Argument 0 is the receiver.
    pub body: Callable,
    pub metadata: MemberMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MemberSlot {
    Property(usize),
    Method(usize),
}

/// A registered class.
///
/// Properties back getter and setter decorations, methods back method
/// decorations. Member names are unique across both.
#[derive(Debug, Clone)]
pub struct ClassDef {
    name: Arc<str>,
    semantics: Semantics,
    properties: Vec<PropertyDef>,
    methods: Vec<MethodDef>,
    index: FxHashMap<Arc<str>, MemberSlot>,
}

impl ClassDef {
    pub fn new(name: impl Into<Arc<str>>, semantics: Semantics) -> Self {
        Self {
            name: name.into(),
            semantics,
            properties: Vec::new(),
            methods: Vec::new(),
            index: FxHashMap::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn name_arc(&self) -> Arc<str> {
        Arc::clone(&self.name)
    }

    pub fn semantics(&self) -> Semantics {
        self.semantics
    }

    pub fn add_property(&mut self, property: PropertyDef) -> Result<(), DecorationError> {
        self.check_descriptors(&property.name, &property.metadata, MemberKinds::PROPERTY)?;
        self.claim(&property.name, MemberSlot::Property(self.properties.len()))?;
        self.properties.push(property);
        Ok(())
    }

    pub fn add_method(&mut self, method: MethodDef) -> Result<(), DecorationError> {
        self.check_descriptors(&method.name, &method.metadata, MemberKinds::METHOD)?;
        self.claim(&method.name, MemberSlot::Method(self.methods.len()))?;
        self.methods.push(method);
        Ok(())
    }

    /// Descriptors may only target kinds the member supports.
    fn check_descriptors(
        &self,
        name: &str,
        metadata: &MemberMetadata,
        supported: MemberKinds,
    ) -> Result<(), DecorationError> {
        let stray = metadata.descriptor_kinds().difference(supported);
        match MemberKind::ALL.into_iter().find(|kind| stray.contains(kind.flag())) {
            Some(kind) => Err(DecorationError::UnknownMember {
                class: self.name.to_string(),
                member: name.to_string(),
                kind,
            }),
            None => Ok(()),
        }
    }

    fn claim(&mut self, name: &Arc<str>, slot: MemberSlot) -> Result<(), DecorationError> {
        if self.index.contains_key(name) {
            return Err(DecorationError::DuplicateMember {
                class: self.name.to_string(),
                member: name.to_string(),
            });
        }
        self.index.insert(Arc::clone(name), slot);
        Ok(())
    }

    pub fn property(&self, name: &str) -> Option<&PropertyDef> {
        match self.index.get(name)? {
            MemberSlot::Property(i) => self.properties.get(*i),
            MemberSlot::Method(_) => None,
        }
    }

    pub fn method(&self, name: &str) -> Option<&MethodDef> {
        match self.index.get(name)? {
            MemberSlot::Method(i) => self.methods.get(*i),
            MemberSlot::Property(_) => None,
        }
    }

    /// Properties in declaration order.
    pub fn properties(&self) -> &[PropertyDef] {
        &self.properties
    }

    /// Methods in declaration order.
    pub fn methods(&self) -> &[MethodDef] {
        &self.methods
    }

    /// The kinds `member` can be decorated for; empty when undeclared.
    pub fn member_kinds(&self, member: &str) -> MemberKinds {
        match self.index.get(member) {
            Some(MemberSlot::Property(_)) => MemberKinds::PROPERTY,
            Some(MemberSlot::Method(_)) => MemberKinds::METHOD,
            None => MemberKinds::empty(),
        }
    }

    /// Metadata of the member backing `kind`, if declared.
    pub fn metadata(&self, kind: MemberKind, member: &str) -> Option<&MemberMetadata> {
        match kind {
            MemberKind::Getter | MemberKind::Setter => self.property(member).map(|p| &p.metadata),
            MemberKind::Method => self.method(member).map(|m| &m.metadata),
        }
    }

    /// Field values of a freshly constructed instance.
    pub fn default_fields(&self) -> BTreeMap<String, Dynamic> {
        self.properties
            .iter()
            .map(|p| (p.name.to_string(), p.default.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CallContext, Signature};

    fn noop(name: &str) -> MethodDef {
        MethodDef {
            name: name.into(),
            body: Callable::new(name, Signature::variadic(), |_ctx: &mut CallContext<'_>| Ok(())),
            metadata: MemberMetadata::none(),
        }
    }

    fn prop(name: &str, default: i64) -> PropertyDef {
        PropertyDef {
            name: name.into(),
            default: Dynamic::Int(default),
            metadata: MemberMetadata::text("GetDecorator = @trace"),
        }
    }

    #[test]
    fn members_are_indexed_by_kind() {
        let mut class = ClassDef::new("Gauge", Semantics::Reference);
        class.add_property(prop("level", 3)).unwrap();
        class.add_method(noop("reset")).unwrap();

        assert_eq!(class.member_kinds("level"), MemberKinds::PROPERTY);
        assert_eq!(class.member_kinds("reset"), MemberKinds::METHOD);
        assert!(class.member_kinds("missing").is_empty());
        assert!(class.property("reset").is_none());

        let text = class
            .metadata(MemberKind::Getter, "level")
            .and_then(|m| m.text.as_deref());
        assert_eq!(text, Some("GetDecorator = @trace"));
        assert_eq!(class.default_fields().get("level"), Some(&Dynamic::Int(3)));
    }

    #[test]
    fn descriptors_must_match_member_kind() {
        let mut class = ClassDef::new("Gauge", Semantics::Reference);
        let mut level = prop("level", 0);
        level.metadata = MemberMetadata::none()
            .with_descriptors(MemberKind::Setter, vec![DecoratorSpec::named("immutable")])
            .with_descriptors(MemberKind::Method, vec![DecoratorSpec::named("trace")]);
        let err = class.add_property(level).unwrap_err();
        assert_eq!(
            err,
            DecorationError::UnknownMember {
                class: "Gauge".into(),
                member: "level".into(),
                kind: MemberKind::Method,
            }
        );
        assert!(class.properties().is_empty());
    }

    #[test]
    fn duplicate_member_names_rejected() {
        let mut class = ClassDef::new("Gauge", Semantics::Value);
        class.add_property(prop("level", 0)).unwrap();
        let err = class.add_method(noop("level")).unwrap_err();
        assert_eq!(
            err,
            DecorationError::DuplicateMember {
                class: "Gauge".into(),
                member: "level".into(),
            }
        );
        assert_eq!(class.methods().len(), 0);
    }

    #[test]
    fn descriptors_are_per_kind() {
        let metadata = MemberMetadata::none()
            .with_descriptors(MemberKind::Setter, vec![DecoratorSpec::named("immutable")]);
        assert!(metadata.descriptors(MemberKind::Getter).is_none());
        assert_eq!(metadata.descriptors(MemberKind::Setter).map(<[_]>::len), Some(1));
        assert!(!metadata.is_empty());
        assert!(MemberMetadata::text("  ").is_empty());
    }
}
