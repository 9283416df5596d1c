//! The seam between callables and the runtime that executes them.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use super::{Dynamic, ObjectHeap};
use crate::{DispatchError, NativeError, Segment};

/// Work scheduled to run later on the host, outside any dispatch.
///
/// Deferred work is fire-and-forget: its result never reaches the call that
/// scheduled it.
pub type DeferredTask = Box<dyn FnOnce(&mut dyn Host) -> Result<(), NativeError> + Send>;

/// Identifier of a scheduled task, used for cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(pub u64);

/// Services a callable can use while it runs.
///
/// The runtime implements this; [`DetachedHost`] implements it without a
/// dispatcher for invoking callables on their own.
pub trait Host {
    fn heap(&self) -> &ObjectHeap;

    fn heap_mut(&mut self) -> &mut ObjectHeap;

    /// Monotonic time since the host started.
    fn now(&self) -> Duration;

    /// Run `task` once `delay` has elapsed.
    fn schedule(&mut self, delay: Duration, task: DeferredTask) -> TimerId;

    /// Cancel a pending task. Returns false if it already ran or never existed.
    fn cancel(&mut self, timer: TimerId) -> bool;

    /// Mark that a method body of `class` starts executing.
    fn enter_scope(&mut self, class: Arc<str>);

    fn exit_scope(&mut self);

    /// The class whose method body is currently executing, if any.
    fn current_scope(&self) -> Option<&str>;

    /// Dispatch a read or call expression.
    fn read(
        &mut self,
        receiver: &Dynamic,
        path: &[Segment],
        nargout: usize,
    ) -> Result<Vec<Dynamic>, DispatchError>;

    /// Dispatch an assignment; returns the updated receiver binding.
    fn write(
        &mut self,
        receiver: Dynamic,
        path: &[Segment],
        value: Dynamic,
    ) -> Result<Dynamic, DispatchError>;
}

/// A host with a heap, a manual clock and a timer list, but no dispatcher.
///
/// `read` and `write` fail with [`DispatchError::InvalidAccess`].
#[derive(Default)]
pub struct DetachedHost {
    heap: ObjectHeap,
    now: Duration,
    next_timer: u64,
    timers: Vec<(TimerId, Duration, DeferredTask)>,
    scopes: Vec<Arc<str>>,
}

impl DetachedHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }

    /// Move the clock forward and run every task that became due, earliest
    /// first. Tasks scheduled while the batch runs wait for the next call.
    /// Returns the failures of the tasks that ran.
    pub fn advance(&mut self, by: Duration) -> Vec<NativeError> {
        self.now += by;
        let mut due: Vec<(Duration, TimerId)> = self
            .timers
            .iter()
            .filter(|(_, deadline, _)| *deadline <= self.now)
            .map(|(id, deadline, _)| (*deadline, *id))
            .collect();
        due.sort();

        let mut failures = Vec::new();
        for (_, timer) in due {
            let Some(pos) = self.timers.iter().position(|(id, _, _)| *id == timer) else {
                continue;
            };
            let (_, _, task) = self.timers.remove(pos);
            let host: &mut dyn Host = self;
            if let Err(error) = task(host) {
                failures.push(error);
            }
        }
        failures
    }
}

impl Host for DetachedHost {
    fn heap(&self) -> &ObjectHeap {
        &self.heap
    }

    fn heap_mut(&mut self) -> &mut ObjectHeap {
        &mut self.heap
    }

    fn now(&self) -> Duration {
        self.now
    }

    fn schedule(&mut self, delay: Duration, task: DeferredTask) -> TimerId {
        self.next_timer += 1;
        let id = TimerId(self.next_timer);
        self.timers.push((id, self.now + delay, task));
        id
    }

    fn cancel(&mut self, timer: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|(id, _, _)| *id != timer);
        self.timers.len() != before
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
        _nargout: usize,
    ) -> Result<Vec<Dynamic>, DispatchError> {
        Err(DispatchError::InvalidAccess {
            segment: path.first().map(|s| s.to_string()).unwrap_or_default(),
            type_name: receiver.type_name(),
        })
    }

    fn write(
        &mut self,
        receiver: Dynamic,
        path: &[Segment],
        _value: Dynamic,
    ) -> Result<Dynamic, DispatchError> {
        Err(DispatchError::InvalidAccess {
            segment: path.first().map(|s| s.to_string()).unwrap_or_default(),
            type_name: receiver.type_name(),
        })
    }
}

impl fmt::Debug for DetachedHost {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DetachedHost")
            .field("now", &self.now)
            .field("pending_timers", &self.timers.len())
            .finish()
    }
}
