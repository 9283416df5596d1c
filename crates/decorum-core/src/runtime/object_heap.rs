//! Arena for reference-semantics instances.

use std::fmt;

use crate::Instance;

/// Copyable handle to an instance in the [`ObjectHeap`].
///
/// `generation` changes every time a slot is reused, so a handle to a freed
/// instance never reaches the slot's next occupant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObjectHandle {
    pub index: u32,
    pub generation: u32,
}

/// Storage for instances shared through [`Dynamic::Object`](crate::Dynamic)
/// handles. Every handle to the same slot observes the same fields and the
/// same decoration registry.
#[derive(Default)]
pub struct ObjectHeap {
    slots: Vec<Slot>,
    vacant: Vec<u32>,
}

struct Slot {
    generation: u32,
    instance: Option<Instance>,
}

impl ObjectHeap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move `instance` into the heap.
    pub fn allocate(&mut self, instance: Instance) -> ObjectHandle {
        if let Some(index) = self.vacant.pop() {
            let slot = &mut self.slots[index as usize];
            slot.instance = Some(instance);
            return ObjectHandle {
                index,
                generation: slot.generation,
            };
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            generation: 0,
            instance: Some(instance),
        });
        ObjectHandle {
            index,
            generation: 0,
        }
    }

    fn slot(&self, handle: ObjectHandle) -> Option<&Slot> {
        self.slots
            .get(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)
    }

    /// The instance behind `handle`; `None` once it has been freed.
    pub fn instance(&self, handle: ObjectHandle) -> Option<&Instance> {
        self.slot(handle)?.instance.as_ref()
    }

    pub fn instance_mut(&mut self, handle: ObjectHandle) -> Option<&mut Instance> {
        self.slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)?
            .instance
            .as_mut()
    }

    /// Remove the instance behind `handle` and retire the handle.
    pub fn free(&mut self, handle: ObjectHandle) -> Option<Instance> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .filter(|slot| slot.generation == handle.generation)?;
        let instance = slot.instance.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.vacant.push(handle.index);
        Some(instance)
    }

    /// Number of live instances.
    pub fn len(&self) -> usize {
        self.slots.len() - self.vacant.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ObjectHeap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectHeap")
            .field("live", &self.len())
            .field("vacant", &self.vacant.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use super::*;
    use crate::{ClassDef, Dynamic, InstanceId, Semantics};

    fn gauge(id: u64) -> Instance {
        let class = Arc::new(ClassDef::new("Gauge", Semantics::Reference));
        let fields = BTreeMap::from([("level".to_string(), Dynamic::Int(0))]);
        Instance::new(InstanceId(id), class, fields)
    }

    #[test]
    fn handles_share_one_instance() {
        let mut heap = ObjectHeap::new();
        let handle = heap.allocate(gauge(1));
        let copy = handle;

        heap.instance_mut(handle)
            .unwrap()
            .set_field("level", Dynamic::Int(7))
            .unwrap();
        assert_eq!(
            heap.instance(copy).and_then(|gauge| gauge.field("level")),
            Some(&Dynamic::Int(7))
        );
        assert_eq!(heap.len(), 1);
    }

    #[test]
    fn freed_slots_are_reused_with_a_new_generation() {
        let mut heap = ObjectHeap::new();
        let old = heap.allocate(gauge(1));
        assert_eq!(heap.free(old).map(|gauge| gauge.id()), Some(InstanceId(1)));
        assert!(heap.free(old).is_none());
        assert!(heap.is_empty());

        let new = heap.allocate(gauge(2));
        assert_eq!(new.index, old.index);
        assert_ne!(new.generation, old.generation);
        assert!(heap.instance(old).is_none());
        assert!(heap.instance_mut(old).is_none());
        assert_eq!(heap.instance(new).map(Instance::id), Some(InstanceId(2)));
    }
}
