//! Call counting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use decorum_core::{Arity, CallContext, Callable};
use decorum_registry::Decorator;

/// One counted call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountRecord {
    /// `Class.member`
    pub member: String,
    /// Calls through this chain so far, this one included.
    pub count: u64,
}

/// Shared log of counted calls.
///
/// Each decorated chain keeps its own count; the log interleaves all of
/// them in call order.
#[derive(Debug, Clone, Default)]
pub struct CallCounter {
    records: Arc<Mutex<Vec<CountRecord>>>,
}

impl CallCounter {
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self, record: CountRecord) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record);
    }

    pub fn records(&self) -> Vec<CountRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// The count sequence observed for `member` (`Class.member`).
    pub fn counts_for(&self, member: &str) -> Vec<u64> {
        self.records()
            .into_iter()
            .filter(|record| record.member == member)
            .map(|record| record.count)
            .collect()
    }

    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// `countCalls`: counts every call through the chain, before forwarding.
pub fn count_calls(counter: CallCounter) -> Decorator {
    Decorator::wrapper("countCalls", Arity::Exact(2), move |wrapped, ctx, _args| {
        let calls = Arc::new(AtomicU64::new(0));
        let counter = counter.clone();
        let member = ctx.qualified_member();
        let inner = wrapped.clone();
        Ok(Callable::wrapping(&wrapped, "countCalls", move |call: &mut CallContext<'_>| {
            let count = calls.fetch_add(1, Ordering::Relaxed) + 1;
            tracing::debug!(member = %member, count, "counted call");
            counter.record(CountRecord {
                member: member.clone(),
                count,
            });
            let outputs = call.forward(&inner)?;
            call.set_outputs(outputs);
            Ok(())
        }))
    })
}
