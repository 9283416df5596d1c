//! Time-based policies: `delayedExec`, `throttle` and `debounce`.
//!
//! Deferred calls go through [`Host::schedule`] and run later with no
//! caller waiting on them. A call that returns before reaching the wrapped
//! callable produces stand-in outputs (see [`crate::skipped_outputs`]).

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use decorum_core::{Arity, CallContext, Callable, Dynamic, Host, MemberKind, TimerId};
use decorum_registry::Decorator;

use crate::{arg, skipped_outputs, skipping_signature};

/// Schedule a call of `target` with `args` after `delay`.
fn defer(
    call: &mut CallContext<'_>,
    target: &Callable,
    member: &str,
    delay: Duration,
) -> TimerId {
    let target = target.clone();
    let args = call.args().to_vec();
    let label = member.to_string();
    call.host().schedule(
        delay,
        Box::new(move |host: &mut dyn Host| {
            tracing::debug!(member = %label, "running deferred call");
            target.call(host, args, 0).map(drop)
        }),
    )
}

/// `delayedExec(secs)`: runs the wrapped callable once `secs` seconds have
/// passed and returns immediately.
pub fn delayed_exec() -> Decorator {
    Decorator::wrapper("delayedExec", Arity::Exact(3), |wrapped, ctx, args| {
        let delay: Duration = arg(args, 0)?;
        let kind = ctx.kind;
        let member = ctx.qualified_member();
        let inner = wrapped.clone();

        Ok(Callable::new(
            "delayedExec",
            skipping_signature(kind, wrapped.signature()),
            move |call: &mut CallContext<'_>| {
                let timer = defer(call, &inner, &member, delay);
                tracing::debug!(member = %member, ?delay, ?timer, "deferred call");
                let outputs = skipped_outputs(kind, inner.signature(), call, None)?;
                call.set_outputs(outputs);
                Ok(())
            },
        ))
    })
}

#[derive(Default)]
struct ThrottleState {
    last: Option<Duration>,
    cached: Option<Dynamic>,
}

/// `throttle(secs)`: lets at most one call through per `secs` seconds.
///
/// Dropped getter calls yield the last value read.
pub fn throttle() -> Decorator {
    Decorator::wrapper("throttle", Arity::Exact(3), |wrapped, ctx, args| {
        let interval: Duration = arg(args, 0)?;
        let kind = ctx.kind;
        let member = ctx.qualified_member();
        let state = Arc::new(Mutex::new(ThrottleState::default()));
        let inner = wrapped.clone();

        Ok(Callable::new(
            "throttle",
            skipping_signature(kind, wrapped.signature()),
            move |call: &mut CallContext<'_>| {
                let now = call.host_ref().now();
                let (admitted, cached) = {
                    let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                    match state.last {
                        Some(at) if now.saturating_sub(at) < interval => {
                            (false, state.cached.clone())
                        }
                        _ => {
                            state.last = Some(now);
                            (true, None)
                        }
                    }
                };

                let outputs = if admitted {
                    let outputs = call.forward(&inner)?;
                    if kind == MemberKind::Getter {
                        let mut state = state.lock().unwrap_or_else(PoisonError::into_inner);
                        state.cached = outputs.first().cloned();
                    }
                    outputs
                } else {
                    tracing::debug!(member = %member, ?interval, "throttled call");
                    skipped_outputs(kind, inner.signature(), call, cached)?
                };
                call.set_outputs(outputs);
                Ok(())
            },
        ))
    })
}

/// `debounce(secs)`: each call cancels the pending one and schedules
/// itself `secs` seconds out, so only the last of a burst runs.
pub fn debounce() -> Decorator {
    Decorator::wrapper("debounce", Arity::Exact(3), |wrapped, ctx, args| {
        let delay: Duration = arg(args, 0)?;
        let kind = ctx.kind;
        let member = ctx.qualified_member();
        let pending: Arc<Mutex<Option<TimerId>>> = Arc::default();
        let inner = wrapped.clone();

        Ok(Callable::new(
            "debounce",
            skipping_signature(kind, wrapped.signature()),
            move |call: &mut CallContext<'_>| {
                let previous = pending.lock().unwrap_or_else(PoisonError::into_inner).take();
                if let Some(previous) = previous
                    && call.host().cancel(previous)
                {
                    tracing::debug!(member = %member, ?previous, "superseded pending call");
                }
                let timer = defer(call, &inner, &member, delay);
                *pending.lock().unwrap_or_else(PoisonError::into_inner) = Some(timer);

                let outputs = skipped_outputs(kind, inner.signature(), call, None)?;
                call.set_outputs(outputs);
                Ok(())
            },
        ))
    })
}
