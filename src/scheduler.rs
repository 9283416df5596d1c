//! Deferred execution: clocks and the runtime's timer queue.
//!
//! Policies schedule fire-and-forget work through [`Host::schedule`]; the
//! runtime keeps it here until [`Runtime::run_due_timers`] is called with
//! the clock past the deadline.
//!
//! [`Host::schedule`]: decorum_core::Host::schedule
//! [`Runtime::run_due_timers`]: crate::Runtime::run_due_timers

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use decorum_core::{DeferredTask, TimerId};

/// Monotonic time source.
pub trait Clock: Send + Sync {
    /// Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

/// Wall-clock time since creation.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// A clock that only moves when told to. Clones share the same time.
///
/// ```ignore
/// let clock = ManualClock::new();
/// let mut runtime = Runtime::new().with_clock(clock.clone());
/// clock.advance(Duration::from_secs(3));
/// runtime.run_due_timers();
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    nanos: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        let by = u64::try_from(by.as_nanos()).unwrap_or(u64::MAX);
        let step = |now: u64| Some(now.saturating_add(by));
        self.nanos
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, step)
            .ok();
    }

    pub fn set(&self, to: Duration) {
        let to = u64::try_from(to.as_nanos()).unwrap_or(u64::MAX);
        self.nanos.store(to, Ordering::Release);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::Acquire))
    }
}

/// Pending tasks ordered by deadline, ties broken by scheduling order.
#[derive(Default)]
pub(crate) struct TimerQueue {
    next_id: u64,
    entries: BTreeMap<(Duration, TimerId), DeferredTask>,
    deadlines: FxHashMap<TimerId, Duration>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, deadline: Duration, task: DeferredTask) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.entries.insert((deadline, id), task);
        self.deadlines.insert(id, deadline);
        id
    }

    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id) {
            Some(deadline) => self.entries.remove(&(deadline, id)).is_some(),
            None => false,
        }
    }

    /// Tasks due at `now`, earliest first.
    pub fn due(&self, now: Duration) -> Vec<TimerId> {
        self.entries
            .keys()
            .take_while(|(deadline, _)| *deadline <= now)
            .map(|(_, id)| *id)
            .collect()
    }

    /// Remove a pending task; `None` if it already ran or was cancelled.
    pub fn take(&mut self, id: TimerId) -> Option<DeferredTask> {
        let deadline = self.deadlines.remove(&id)?;
        self.entries.remove(&(deadline, id))
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.entries.keys().next().map(|(deadline, _)| *deadline)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

impl fmt::Debug for TimerQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerQueue")
            .field("pending", &self.entries.len())
            .field("next_deadline", &self.next_deadline())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use decorum_core::{Host, NativeError};

    use super::*;

    fn noop() -> DeferredTask {
        Box::new(|_host: &mut dyn Host| Ok::<(), NativeError>(()))
    }

    #[test]
    fn manual_clock_is_shared() {
        let clock = ManualClock::new();
        let other = clock.clone();
        clock.advance(Duration::from_millis(1500));
        assert_eq!(other.now(), Duration::from_millis(1500));
        other.set(Duration::from_secs(10));
        assert_eq!(clock.now(), Duration::from_secs(10));
    }

    #[test]
    fn due_in_deadline_order() {
        let mut queue = TimerQueue::new();
        let late = queue.schedule(Duration::from_secs(5), noop());
        let early = queue.schedule(Duration::from_secs(1), noop());
        let tie = queue.schedule(Duration::from_secs(1), noop());

        assert_eq!(queue.next_deadline(), Some(Duration::from_secs(1)));
        assert!(queue.due(Duration::ZERO).is_empty());
        assert_eq!(queue.due(Duration::from_secs(1)), vec![early, tie]);

        let order = queue.due(Duration::from_secs(5));
        assert_eq!(order, vec![early, tie, late]);
        for id in order {
            assert!(queue.take(id).is_some());
        }
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn cancel_removes_once() {
        let mut queue = TimerQueue::new();
        let id = queue.schedule(Duration::from_secs(1), noop());
        assert!(queue.cancel(id));
        assert!(!queue.cancel(id));
        assert!(queue.due(Duration::from_secs(2)).is_empty());
        assert!(queue.take(id).is_none());
    }
}
