//! Named decorators available to attribute text and `decorate` calls.

use rustc_hash::FxHashMap;

use decorum_core::DecorationError;

use crate::Decorator;

/// Symbol table from decorator name to decorator value.
///
/// Names are matched exactly, dotted names included (`audit.trace`).
#[derive(Debug, Clone, Default)]
pub struct DecoratorNamespace {
    entries: FxHashMap<String, Decorator>,
}

impl DecoratorNamespace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new name. Registering a name twice is an error.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        decorator: Decorator,
    ) -> Result<(), DecorationError> {
        let name = name.into();
        if self.entries.contains_key(&name) {
            return Err(DecorationError::DuplicateDecorator(name));
        }
        self.entries.insert(name, decorator);
        Ok(())
    }

    /// Register or replace, returning the previous value.
    pub fn insert(&mut self, name: impl Into<String>, decorator: Decorator) -> Option<Decorator> {
        self.entries.insert(name.into(), decorator)
    }

    /// Register every entry of `other`; fails on the first clash and
    /// leaves `self` unchanged.
    pub fn merge(&mut self, other: DecoratorNamespace) -> Result<(), DecorationError> {
        if let Some(clash) = other.entries.keys().find(|name| self.entries.contains_key(*name)) {
            return Err(DecorationError::DuplicateDecorator(clash.clone()));
        }
        self.entries.extend(other.entries);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Decorator> {
        self.entries.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Decorator> {
        self.entries.remove(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
