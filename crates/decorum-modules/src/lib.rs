//! Reference decorator policies for decorum.
//!
//! Every policy is an ordinary [`Decorator`] built on the public decorator
//! contract; nothing here reaches into the runtime.
//!
//! - **counting** - `countCalls`: per-chain call counter
//! - **observe** - `trace` and `timed`: enter/exit events and durations
//! - **timing** - `delayedExec(secs)`, `throttle(secs)`, `debounce(secs)`
//! - **guards** - `oneShot(limit)`, `immutable`, `restricted(class)`
//! - **repeat** - `doubleInvoke`
//!
//! # Usage
//!
//! ```ignore
//! use decorum_modules::{Observers, standard_namespace_with};
//!
//! let observers = Observers::default();
//! let namespace = standard_namespace_with(&observers);
//! runtime.namespace_mut().merge(namespace)?;
//!
//! // later
//! assert_eq!(observers.counter.counts_for("Account.balance"), vec![1, 2, 3]);
//! ```

use decorum_core::convert::FromDynamic;
use decorum_core::{CallContext, Dynamic, MemberKind, NativeError, Signature};
use decorum_registry::DecoratorNamespace;

pub mod counting;
pub mod guards;
pub mod observe;
pub mod repeat;
pub mod timing;

pub use counting::{CallCounter, CountRecord};
pub use observe::{TimingRecord, TimingSink, TraceEvent, TracePhase, TraceSink};

/// Shared sinks the observing policies record into.
#[derive(Debug, Clone, Default)]
pub struct Observers {
    pub counter: CallCounter,
    pub trace: TraceSink,
    pub timings: TimingSink,
}

/// Every reference policy under its conventional name, recording into
/// fresh sinks.
pub fn standard_namespace() -> DecoratorNamespace {
    standard_namespace_with(&Observers::default())
}

/// Every reference policy, with the observing ones recording into
/// `observers`.
pub fn standard_namespace_with(observers: &Observers) -> DecoratorNamespace {
    let mut namespace = DecoratorNamespace::new();
    namespace.insert("countCalls", counting::count_calls(observers.counter.clone()));
    namespace.insert("trace", observe::trace(observers.trace.clone()));
    namespace.insert("timed", observe::timed(observers.timings.clone()));
    namespace.insert("delayedExec", timing::delayed_exec());
    namespace.insert("throttle", timing::throttle());
    namespace.insert("debounce", timing::debounce());
    namespace.insert("oneShot", guards::one_shot());
    namespace.insert("immutable", guards::immutable());
    namespace.insert("restricted", guards::restricted());
    namespace.insert("doubleInvoke", repeat::double_invoke());
    namespace
}

// =============================================================================
// HELPERS
// =============================================================================

/// Typed decorator argument `index`, or `default` when it was not given.
pub(crate) fn arg_or<T: FromDynamic>(
    args: &[Dynamic],
    index: usize,
    default: T,
) -> Result<T, NativeError> {
    match args.get(index) {
        Some(value) => T::from_dynamic(value).map_err(NativeError::Conversion),
        None => Ok(default),
    }
}

/// Typed required decorator argument `index`.
pub(crate) fn arg<T: FromDynamic>(args: &[Dynamic], index: usize) -> Result<T, NativeError> {
    let value = args.get(index).ok_or(NativeError::ArgumentIndexOutOfBounds {
        index,
        count: args.len(),
    })?;
    T::from_dynamic(value).map_err(NativeError::Conversion)
}

/// Signature of a wrapper that may return without calling through.
///
/// Methods then produce any number of outputs; accessors keep their
/// contract and get a stand-in result from [`skipped_outputs`].
pub(crate) fn skipping_signature(kind: MemberKind, wrapped: Signature) -> Signature {
    match kind {
        MemberKind::Method if !wrapped.outputs.is_exactly(0) => {
            Signature::new(wrapped.params, decorum_core::Arity::Any)
        }
        _ => wrapped,
    }
}

/// Outputs for a call that did not reach the wrapped callable.
///
/// A value-semantics setter hands back its receiver unchanged and a getter
/// yields `fallback`; anything else yields nothing.
pub(crate) fn skipped_outputs(
    kind: MemberKind,
    wrapped: Signature,
    ctx: &CallContext<'_>,
    fallback: Option<Dynamic>,
) -> Result<Vec<Dynamic>, NativeError> {
    match kind {
        MemberKind::Setter if wrapped.outputs.is_exactly(1) => Ok(vec![ctx.receiver()?.clone()]),
        MemberKind::Getter => Ok(vec![fallback.unwrap_or(Dynamic::Null)]),
        _ => Ok(Vec::new()),
    }
}
