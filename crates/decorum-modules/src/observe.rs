//! Observing policies: `trace` and `timed`.
//!
//! Both forward every call unchanged. Events go to `tracing` and to a
//! shared sink that tests and hosts can inspect.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use decorum_core::{Arity, CallContext, Callable, MemberKind, NativeError};
use decorum_registry::Decorator;

use crate::arg_or;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TracePhase {
    Enter,
    Exit,
    Failed,
}

impl fmt::Display for TracePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TracePhase::Enter => write!(f, "enter"),
            TracePhase::Exit => write!(f, "exit"),
            TracePhase::Failed => write!(f, "failed"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceEvent {
    /// The label given to `trace`, or `Class.member`.
    pub label: String,
    pub kind: MemberKind,
    pub phase: TracePhase,
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.phase, self.kind, self.label)
    }
}

#[derive(Debug, Clone, Default)]
pub struct TraceSink {
    events: Arc<Mutex<Vec<TraceEvent>>>,
}

impl TraceSink {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&self, event: TraceEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    pub fn events(&self) -> Vec<TraceEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Events rendered as `"<phase> <kind> <label>"`.
    pub fn lines(&self) -> Vec<String> {
        self.events().iter().map(ToString::to_string).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimingRecord {
    pub member: String,
    pub elapsed: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct TimingSink {
    records: Arc<Mutex<Vec<TimingRecord>>>,
}

impl TimingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TimingRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// `trace` / `trace('label')`: records entry, exit and failure.
pub fn trace(sink: TraceSink) -> Decorator {
    Decorator::wrapper("trace", Arity::AtLeast(2), move |wrapped, ctx, args| {
        if args.len() > 1 {
            return Err(NativeError::other(format!(
                "trace takes at most one label, got {} arguments",
                args.len()
            )));
        }
        let label: String = arg_or(args, 0, ctx.qualified_member())?;
        let kind = ctx.kind;
        let sink = sink.clone();
        let inner = wrapped.clone();

        Ok(Callable::wrapping(&wrapped, "trace", move |call: &mut CallContext<'_>| {
            let event = |phase| TraceEvent {
                label: label.clone(),
                kind,
                phase,
            };
            tracing::info!(label = %label, %kind, "enter");
            sink.push(event(TracePhase::Enter));
            match call.forward(&inner) {
                Ok(outputs) => {
                    tracing::info!(label = %label, %kind, outputs = outputs.len(), "exit");
                    sink.push(event(TracePhase::Exit));
                    call.set_outputs(outputs);
                    Ok(())
                }
                Err(error) => {
                    tracing::info!(label = %label, %kind, %error, "failed");
                    sink.push(event(TracePhase::Failed));
                    Err(error)
                }
            }
        }))
    })
}

/// `timed`: measures each call on the host clock.
pub fn timed(sink: TimingSink) -> Decorator {
    Decorator::wrapper("timed", Arity::Exact(2), move |wrapped, ctx, _args| {
        let member = ctx.qualified_member();
        let sink = sink.clone();
        let inner = wrapped.clone();

        Ok(Callable::wrapping(&wrapped, "timed", move |call: &mut CallContext<'_>| {
            let started = call.host_ref().now();
            let result = call.forward(&inner);
            let elapsed = call.host_ref().now().saturating_sub(started);
            tracing::debug!(member = %member, ?elapsed, ok = result.is_ok(), "timed call");
            sink.records
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .push(TimingRecord {
                    member: member.clone(),
                    elapsed,
                });
            call.set_outputs(result?);
            Ok(())
        }))
    })
}
