//! Constructed instances and their per-instance decoration registry.

use std::collections::BTreeMap;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::{
    Callable, ClassDef, DispatchError, Dynamic, InstanceId, MemberKind, MemberKinds, Semantics,
};

/// Active chains of one instance, one map per kind.
///
/// Keys are unique per kind. Installing over an existing key replaces the
/// chain in one step and hands back the old one.
#[derive(Debug, Clone, Default)]
pub struct MemberRegistry {
    getters: FxHashMap<Arc<str>, Callable>,
    setters: FxHashMap<Arc<str>, Callable>,
    methods: FxHashMap<Arc<str>, Callable>,
}

impl MemberRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn map(&self, kind: MemberKind) -> &FxHashMap<Arc<str>, Callable> {
        match kind {
            MemberKind::Getter => &self.getters,
            MemberKind::Setter => &self.setters,
            MemberKind::Method => &self.methods,
        }
    }

    fn map_mut(&mut self, kind: MemberKind) -> &mut FxHashMap<Arc<str>, Callable> {
        match kind {
            MemberKind::Getter => &mut self.getters,
            MemberKind::Setter => &mut self.setters,
            MemberKind::Method => &mut self.methods,
        }
    }

    /// Install `chain`, returning the chain it replaced.
    pub fn install(
        &mut self,
        kind: MemberKind,
        member: impl Into<Arc<str>>,
        chain: Callable,
    ) -> Option<Callable> {
        self.map_mut(kind).insert(member.into(), chain)
    }

    pub fn get(&self, kind: MemberKind, member: &str) -> Option<&Callable> {
        self.map(kind).get(member)
    }

    pub fn contains(&self, kind: MemberKind, member: &str) -> bool {
        self.map(kind).contains_key(member)
    }

    pub fn remove(&mut self, kind: MemberKind, member: &str) -> Option<Callable> {
        self.map_mut(kind).remove(member)
    }

    /// The kinds `member` is decorated for.
    pub fn kinds_for(&self, member: &str) -> MemberKinds {
        MemberKind::ALL
            .into_iter()
            .filter(|kind| self.contains(*kind, member))
            .fold(MemberKinds::empty(), |acc, kind| acc | kind.flag())
    }

    pub fn len(&self) -> usize {
        self.getters.len() + self.setters.len() + self.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// An instance of a registered class.
///
/// Reference-semantics instances live in the object heap and are reached
/// through [`Dynamic::Object`]. Value-semantics instances travel inside
/// [`Dynamic::Instance`]; cloning one copies its fields and shares its
/// chains, so decorator state follows the value.
#[derive(Debug, Clone)]
pub struct Instance {
    id: InstanceId,
    class: Arc<ClassDef>,
    fields: BTreeMap<String, Dynamic>,
    decorations: MemberRegistry,
}

impl Instance {
    pub fn new(id: InstanceId, class: Arc<ClassDef>, fields: BTreeMap<String, Dynamic>) -> Self {
        Self {
            id,
            class,
            fields,
            decorations: MemberRegistry::new(),
        }
    }

    pub fn id(&self) -> InstanceId {
        self.id
    }

    pub fn class(&self) -> &Arc<ClassDef> {
        &self.class
    }

    pub fn class_name(&self) -> &str {
        self.class.name()
    }

    pub fn semantics(&self) -> Semantics {
        self.class.semantics()
    }

    pub fn fields(&self) -> &BTreeMap<String, Dynamic> {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Dynamic> {
        self.fields.get(name)
    }

    /// Store a property value. Only declared properties can be written.
    pub fn set_field(&mut self, name: &str, value: Dynamic) -> Result<(), DispatchError> {
        match self.fields.get_mut(name) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(DispatchError::NoSuchMember {
                type_name: self.class.name().to_string(),
                member: name.to_string(),
            }),
        }
    }

    pub fn decorations(&self) -> &MemberRegistry {
        &self.decorations
    }

    pub fn decorations_mut(&mut self) -> &mut MemberRegistry {
        &mut self.decorations
    }
}
