//! The runtime: classes, instances, the decorator namespace, timers and
//! method scopes.
//!
//! # Example
//!
//! ```ignore
//! use decorum::{ClassBuilder, Runtime};
//!
//! let mut runtime = Runtime::with_standard_policies();
//! runtime.register_class(
//!     ClassBuilder::reference("Counter")
//!         .property_with("value", 0i64, "GetDecorator = @countCalls")
//!         .build()?,
//! )?;
//! let counter = runtime.construct("Counter", [("value", Dynamic::Int(4))])?;
//! assert_eq!(runtime.get(&counter, "value")?, Dynamic::Int(4));
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rustc_hash::FxHashMap;

use decorum_core::{
    ClassDef, DecorationError, DecoratorSpec, DecorumError, DeferredTask, DispatchError, Dynamic,
    Host, Instance, InstanceId, MemberKind, ObjectHeap, Segment, Semantics, TimerId,
};
use decorum_modules::Observers;
use decorum_parser::{AttributeParse, parse_attribute};
use decorum_registry::{Decorator, DecoratorNamespace};

use crate::config::RuntimeConfig;
use crate::scheduler::{Clock, SystemClock, TimerQueue};

/// A decoration declared in class metadata, installed on every new
/// instance.
#[derive(Debug, Clone)]
pub(crate) struct DeclaredDecoration {
    pub kind: MemberKind,
    pub member: Arc<str>,
    pub specs: Vec<DecoratorSpec>,
}

#[derive(Debug)]
struct ClassEntry {
    def: Arc<ClassDef>,
    decorations: Vec<DeclaredDecoration>,
}

/// Owns everything needed to construct decorated instances and dispatch
/// accesses against them.
///
/// The runtime is single-threaded: dispatch, decoration and timer runs all
/// take `&mut self`.
pub struct Runtime {
    config: RuntimeConfig,
    namespace: DecoratorNamespace,
    classes: FxHashMap<Arc<str>, ClassEntry>,
    heap: ObjectHeap,
    timers: TimerQueue,
    clock: Arc<dyn Clock>,
    scopes: Vec<Arc<str>>,
    next_instance: u64,
    pub(crate) depth: usize,
}

impl Runtime {
    /// An empty runtime: no classes, no decorators, system clock.
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        Self {
            config,
            namespace: DecoratorNamespace::new(),
            classes: FxHashMap::default(),
            heap: ObjectHeap::new(),
            timers: TimerQueue::new(),
            clock: Arc::new(SystemClock::new()),
            scopes: Vec::new(),
            next_instance: 0,
            depth: 0,
        }
    }

    /// A runtime with every reference policy registered.
    pub fn with_standard_policies() -> Self {
        Self::with_observers(&Observers::default())
    }

    /// A runtime with every reference policy registered, the observing
    /// ones recording into `observers`.
    pub fn with_observers(observers: &Observers) -> Self {
        let mut runtime = Self::new();
        runtime.namespace = decorum_modules::standard_namespace_with(observers);
        runtime
    }

    /// Replace the clock used for timers and [`Host::now`].
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    // =========================================================================
    // Decorators
    // =========================================================================

    pub fn namespace(&self) -> &DecoratorNamespace {
        &self.namespace
    }

    pub fn namespace_mut(&mut self) -> &mut DecoratorNamespace {
        &mut self.namespace
    }

    /// Make `decorator` available to attribute text and `decorate` calls.
    pub fn register_decorator(
        &mut self,
        name: impl Into<String>,
        decorator: Decorator,
    ) -> Result<(), DecorationError> {
        self.namespace.register(name, decorator)
    }

    // =========================================================================
    // Classes and instances
    // =========================================================================

    /// Register a class and read its decoration metadata.
    ///
    /// Attribute text is parsed once, here. Ambiguous text leaves the member
    /// undecorated for that kind with a warning, or fails when
    /// [`RuntimeConfig::strict_attributes`] is set. Decorator names are only
    /// resolved when an instance is constructed.
    pub fn register_class(&mut self, def: ClassDef) -> Result<(), DecorationError> {
        if self.classes.contains_key(def.name()) {
            return Err(DecorationError::DuplicateClass(def.name().to_string()));
        }
        let decorations = self.declared_decorations(&def)?;
        tracing::debug!(
            class = def.name(),
            decorations = decorations.len(),
            "registered class"
        );
        let def = Arc::new(def);
        self.classes
            .insert(def.name_arc(), ClassEntry { def, decorations });
        Ok(())
    }

    fn declared_decorations(
        &self,
        def: &ClassDef,
    ) -> Result<Vec<DeclaredDecoration>, DecorationError> {
        let members = def
            .properties()
            .iter()
            .map(|p| &p.name)
            .chain(def.methods().iter().map(|m| &m.name))
            .flat_map(|member| {
                let kinds = def.member_kinds(member);
                MemberKind::ALL
                    .into_iter()
                    .filter(move |kind| kinds.contains(kind.flag()))
                    .map(move |kind| (kind, member))
            });

        let mut declared = Vec::new();
        for (kind, member) in members {
            let Some(metadata) = def.metadata(kind, member) else {
                continue;
            };
            let specs = if let Some(descriptors) = metadata.descriptors(kind) {
                descriptors.to_vec()
            } else if let Some(text) = metadata.text.as_deref() {
                match parse_attribute(text, kind) {
                    AttributeParse::Decorated(attribute) => attribute.specs,
                    AttributeParse::Undecorated => continue,
                    AttributeParse::Ambiguous(reason) => {
                        if self.config.strict_attributes {
                            return Err(DecorationError::AmbiguousAttribute {
                                class: def.name().to_string(),
                                member: member.to_string(),
                                keyword: kind.keyword(),
                            });
                        }
                        tracing::warn!(
                            class = def.name(),
                            member = %member,
                            keyword = kind.keyword(),
                            %reason,
                            "ambiguous decoration attribute ignored"
                        );
                        continue;
                    }
                }
            } else {
                continue;
            };

            if !specs.is_empty() {
                declared.push(DeclaredDecoration {
                    kind,
                    member: Arc::clone(member),
                    specs,
                });
            }
        }
        Ok(declared)
    }

    pub fn class(&self, name: &str) -> Option<&Arc<ClassDef>> {
        self.classes.get(name).map(|entry| &entry.def)
    }

    /// Construct an instance of `class` and install its declared
    /// decorations.
    ///
    /// `fields` overrides property defaults. Reference-semantics classes
    /// yield a [`Dynamic::Object`] handle, value-semantics classes a
    /// [`Dynamic::Instance`].
    pub fn construct<K, I>(&mut self, class: &str, fields: I) -> Result<Dynamic, DecorumError>
    where
        K: AsRef<str>,
        I: IntoIterator<Item = (K, Dynamic)>,
    {
        let entry = self
            .classes
            .get(class)
            .ok_or_else(|| DecorationError::UnknownClass(class.to_string()))?;
        let def = Arc::clone(&entry.def);
        let decorations = entry.decorations.clone();

        let mut values = def.default_fields();
        for (name, value) in fields {
            let name = name.as_ref();
            match values.get_mut(name) {
                Some(slot) => *slot = value,
                None => {
                    return Err(DecorationError::UnknownMember {
                        class: class.to_string(),
                        member: name.to_string(),
                        kind: MemberKind::Setter,
                    }
                    .into());
                }
            }
        }

        self.next_instance += 1;
        let id = InstanceId(self.next_instance);
        let instance = Instance::new(id, Arc::clone(&def), values);
        let mut receiver = match def.semantics() {
            Semantics::Reference => Dynamic::Object(self.heap.allocate(instance)),
            Semantics::Value => Dynamic::Instance(Box::new(instance)),
        };

        for declared in &decorations {
            match self.decorate_specs(
                receiver.clone(),
                &declared.member,
                declared.kind,
                &declared.specs,
            ) {
                Ok(updated) => receiver = updated,
                Err(error) => {
                    if let Some(handle) = receiver.as_handle() {
                        self.heap.free(handle);
                    }
                    return Err(error.into());
                }
            }
        }
        tracing::debug!(class, %id, "constructed instance");
        Ok(receiver)
    }

    /// Free a heap instance. Other handles to it become stale. Returns
    /// false for value instances and handles that were already freed.
    pub fn release(&mut self, receiver: &Dynamic) -> bool {
        receiver
            .as_handle()
            .is_some_and(|handle| self.heap.free(handle).is_some())
    }

    /// Borrow the instance a receiver denotes.
    pub fn instance<'a>(&'a self, receiver: &'a Dynamic) -> Result<&'a Instance, DispatchError> {
        match receiver {
            Dynamic::Object(handle) => self
                .heap
                .instance(*handle)
                .ok_or(DispatchError::StaleHandle {
                    index: handle.index,
                }),
            Dynamic::Instance(instance) => Ok(instance.as_ref()),
            other => Err(DispatchError::InvalidAccess {
                segment: "instance access".to_string(),
                type_name: other.type_name(),
            }),
        }
    }

    /// Mutate a heap instance in place.
    pub(crate) fn heap_instance_mut(
        &mut self,
        receiver: &Dynamic,
    ) -> Result<&mut Instance, DispatchError> {
        let handle = receiver
            .as_handle()
            .ok_or_else(|| DispatchError::InvalidAccess {
                segment: "in-place update".to_string(),
                type_name: receiver.type_name(),
            })?;
        self.heap
            .instance_mut(handle)
            .ok_or(DispatchError::StaleHandle {
                index: handle.index,
            })
    }

    // =========================================================================
    // Timers
    // =========================================================================

    /// Run every deferred task whose deadline has passed, earliest first.
    ///
    /// Only tasks due when the call starts run; tasks they schedule wait
    /// for the next call, and tasks they cancel are skipped. Failures are
    /// logged and dropped. Returns how many tasks ran.
    pub fn run_due_timers(&mut self) -> usize {
        let due = self.timers.due(self.clock.now());
        let mut ran = 0;
        for timer in due {
            let Some(task) = self.timers.take(timer) else {
                continue;
            };
            ran += 1;
            let host: &mut dyn Host = self;
            if let Err(error) = task(host) {
                tracing::warn!(timer = timer.0, %error, "deferred task failed");
            }
        }
        ran
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Deadline of the earliest pending task, on the runtime clock.
    pub fn next_timer_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

impl Host for Runtime {
    fn heap(&self) -> &ObjectHeap {
        &self.heap
    }

    fn heap_mut(&mut self) -> &mut ObjectHeap {
        &mut self.heap
    }

    fn now(&self) -> Duration {
        self.clock.now()
    }

    fn schedule(&mut self, delay: Duration, task: DeferredTask) -> TimerId {
        let deadline = self.clock.now().saturating_add(delay);
        let timer = self.timers.schedule(deadline, task);
        tracing::trace!(timer = timer.0, ?deadline, "scheduled task");
        timer
    }

    fn cancel(&mut self, timer: TimerId) -> bool {
        self.timers.cancel(timer)
    }

    fn enter_scope(&mut self, class: Arc<str>) {
        self.scopes.push(class);
    }

    fn exit_scope(&mut self) {
        self.scopes.pop();
    }

    fn current_scope(&self) -> Option<&str> {
        self.scopes.last().map(|class| &**class)
    }

    fn read(
        &mut self,
        receiver: &Dynamic,
        path: &[Segment],
        nargout: usize,
    ) -> Result<Vec<Dynamic>, DispatchError> {
        self.dispatch_read(receiver, path, nargout)
    }

    fn write(
        &mut self,
        receiver: Dynamic,
        path: &[Segment],
        value: Dynamic,
    ) -> Result<Dynamic, DispatchError> {
        self.dispatch_write(receiver, path, value)
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("config", &self.config)
            .field("decorators", &self.namespace.len())
            .field("classes", &self.classes.len())
            .field("live_instances", &self.heap.len())
            .field("timers", &self.timers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use decorum_core::{Arity, CallContext, NativeError, Signature};

    use super::*;
    use crate::ClassBuilder;
    use crate::scheduler::ManualClock;

    fn gauge() -> ClassDef {
        ClassBuilder::reference("Gauge")
            .property_with("level", 0i64, "GetDecorator = @countCalls")
            .property("label", "g")
            .method(
                "reset",
                Signature::method(0, Arity::Exact(0)),
                |_ctx: &mut CallContext<'_>| Ok(()),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn register_and_construct() {
        let mut runtime = Runtime::with_standard_policies();
        runtime.register_class(gauge()).unwrap();
        assert_eq!(
            runtime.register_class(gauge()),
            Err(DecorationError::DuplicateClass("Gauge".into()))
        );

        let gauge = runtime
            .construct("Gauge", [("level", Dynamic::Int(3))])
            .unwrap();
        let instance = runtime.instance(&gauge).unwrap();
        assert_eq!(instance.field("level"), Some(&Dynamic::Int(3)));
        assert!(instance.decorations().contains(MemberKind::Getter, "level"));
        assert!(!instance.decorations().contains(MemberKind::Setter, "level"));
    }

    #[test]
    fn construct_errors() {
        let mut runtime = Runtime::with_standard_policies();
        assert!(matches!(
            runtime.construct("Missing", Vec::<(&str, Dynamic)>::new()),
            Err(DecorumError::Decoration(DecorationError::UnknownClass(_)))
        ));

        runtime.register_class(gauge()).unwrap();
        assert!(matches!(
            runtime.construct("Gauge", [("depth", Dynamic::Int(1))]),
            Err(DecorumError::Decoration(DecorationError::UnknownMember { .. }))
        ));
    }

    #[test]
    fn unresolved_names_fail_at_construction() {
        let mut runtime = Runtime::new();
        runtime.register_class(gauge()).unwrap();
        let err = runtime
            .construct("Gauge", Vec::<(&str, Dynamic)>::new())
            .unwrap_err();
        assert!(matches!(
            err,
            DecorumError::Decoration(DecorationError::Resolution { ref name, .. })
                if name == "countCalls"
        ));
        assert!(runtime.heap().is_empty());
    }

    #[test]
    fn strict_attributes_reject_ambiguity() {
        let ambiguous = || {
            ClassBuilder::value("Twice")
                .property_with("x", 0i64, "GetDecorator = @trace; GetDecorator = @timed")
                .build()
                .unwrap()
        };

        let mut lenient = Runtime::with_standard_policies();
        lenient.register_class(ambiguous()).unwrap();
        let twice = lenient
            .construct("Twice", Vec::<(&str, Dynamic)>::new())
            .unwrap();
        assert!(lenient.instance(&twice).unwrap().decorations().is_empty());

        let mut strict = Runtime::with_config(RuntimeConfig::default().strict_attributes(true));
        assert!(matches!(
            strict.register_class(ambiguous()),
            Err(DecorationError::AmbiguousAttribute { keyword: "GetDecorator", .. })
        ));
    }

    #[test]
    fn timers_run_on_the_runtime_clock() {
        let clock = ManualClock::new();
        let mut runtime = Runtime::new().with_clock(clock.clone());

        runtime.schedule(
            Duration::from_secs(2),
            Box::new(|_host: &mut dyn Host| Ok::<(), NativeError>(())),
        );
        runtime.schedule(
            Duration::from_secs(1),
            Box::new(|_host: &mut dyn Host| Err(NativeError::other("dropped"))),
        );
        assert_eq!(runtime.pending_timers(), 2);
        assert_eq!(runtime.next_timer_deadline(), Some(Duration::from_secs(1)));

        assert_eq!(runtime.run_due_timers(), 0);
        clock.advance(Duration::from_secs(1));
        assert_eq!(runtime.run_due_timers(), 1);
        clock.advance(Duration::from_secs(1));
        assert_eq!(runtime.run_due_timers(), 1);
        assert_eq!(runtime.pending_timers(), 0);
    }

    #[test]
    fn scopes_nest() {
        let mut runtime = Runtime::new();
        assert_eq!(runtime.current_scope(), None);
        runtime.enter_scope(Arc::from("A"));
        runtime.enter_scope(Arc::from("B"));
        assert_eq!(runtime.current_scope(), Some("B"));
        runtime.exit_scope();
        assert_eq!(runtime.current_scope(), Some("A"));
    }

    fn requeue(runs: Arc<AtomicUsize>) -> DeferredTask {
        Box::new(move |host: &mut dyn Host| {
            runs.fetch_add(1, Ordering::SeqCst);
            host.schedule(Duration::ZERO, requeue(Arc::clone(&runs)));
            Ok(())
        })
    }

    #[test]
    fn due_timers_run_one_batch() {
        let clock = ManualClock::new();
        let mut runtime = Runtime::new().with_clock(clock.clone());
        let runs = Arc::new(AtomicUsize::new(0));
        runtime.schedule(Duration::ZERO, requeue(Arc::clone(&runs)));

        assert_eq!(runtime.run_due_timers(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        assert_eq!(runtime.pending_timers(), 1);

        assert_eq!(runtime.run_due_timers(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn cancelled_tasks_in_a_batch_are_skipped() {
        let clock = ManualClock::new();
        let mut runtime = Runtime::new().with_clock(clock.clone());
        let runs = Arc::new(AtomicUsize::new(0));

        let victim = {
            let runs = Arc::clone(&runs);
            runtime.schedule(
                Duration::from_secs(1),
                Box::new(move |_host: &mut dyn Host| {
                    runs.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }),
            )
        };
        runtime.schedule(
            Duration::ZERO,
            Box::new(move |host: &mut dyn Host| {
                host.cancel(victim);
                Ok(())
            }),
        );

        clock.advance(Duration::from_secs(1));
        assert_eq!(runtime.run_due_timers(), 1);
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        assert_eq!(runtime.pending_timers(), 0);
    }
}
