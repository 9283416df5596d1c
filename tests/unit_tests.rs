//! End-to-end tests for decorum using `Runtime` as the entry point.
//!
//! Classes declare their decorations in attribute text, are constructed
//! through the runtime, and are exercised only through the dispatcher.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use decorum::prelude::*;
use decorum::{ClassDef, ContractViolation, Decorator};

type Log = Arc<Mutex<Vec<String>>>;

/// A decorator that logs `<tag>-enter` and `<tag>-exit` around the call.
fn logging(tag: &'static str, log: &Log) -> Decorator {
    let log = Arc::clone(log);
    Decorator::simple(tag, move |wrapped, _ctx, _args| {
        let log = Arc::clone(&log);
        let inner = wrapped.clone();
        Ok(Callable::wrapping(&wrapped, tag, move |ctx: &mut CallContext<'_>| {
            log.lock().unwrap().push(format!("{tag}-enter"));
            let outputs = ctx.forward(&inner)?;
            log.lock().unwrap().push(format!("{tag}-exit"));
            ctx.set_outputs(outputs);
            Ok(())
        }))
    })
}

/// A getter decorator applying `f` to the wrapped result.
fn mapping(name: &'static str, f: fn(i64) -> i64) -> Decorator {
    Decorator::simple(name, move |wrapped, _ctx, _args| {
        let inner = wrapped.clone();
        Ok(Callable::wrapping(&wrapped, name, move |ctx: &mut CallContext<'_>| {
            let value: i64 = match ctx.forward(&inner)?.first() {
                Some(value) => i64::from_dynamic(value)?,
                None => 0,
            };
            ctx.set_return(f(value));
            Ok(())
        }))
    })
}

fn empty() -> Vec<(&'static str, Dynamic)> {
    Vec::new()
}

// =============================================================================
// Composition
// =============================================================================

#[test]
fn test_chain_order() {
    let log: Log = Arc::default();
    let mut runtime = Runtime::new();
    runtime.register_decorator("d1", logging("d1", &log)).unwrap();
    runtime.register_decorator("d2", logging("d2", &log)).unwrap();

    let body_log = Arc::clone(&log);
    runtime
        .register_class(
            ClassBuilder::reference("Task")
                .method_with(
                    "run",
                    Signature::method(0, Arity::Exact(0)),
                    "Decorator = [@d1, @d2]",
                    move |_ctx: &mut CallContext<'_>| {
                        body_log.lock().unwrap().push("b".to_string());
                        Ok(())
                    },
                )
                .build()
                .unwrap(),
        )
        .unwrap();

    let task = runtime.construct("Task", empty()).unwrap();
    runtime.call(&task, "run", Vec::new(), 0).unwrap();
    assert_eq!(
        *log.lock().unwrap(),
        vec!["d1-enter", "d2-enter", "b", "d2-exit", "d1-exit"]
    );
}

fn gauge_class() -> ClassDef {
    ClassBuilder::reference("Gauge")
        .property("level", 4i64)
        .build()
        .unwrap()
}

#[test]
fn test_redecoration_replaces_chain() {
    let mut runtime = Runtime::new();
    runtime.register_class(gauge_class()).unwrap();
    let gauge = runtime.construct("Gauge", empty()).unwrap();

    let plus_one = mapping("plusOne", |n| n + 1);
    let gauge = runtime
        .decorate(gauge, "level", MemberKind::Getter, [plus_one], Vec::new())
        .unwrap();
    assert_eq!(runtime.get(&gauge, "level").unwrap(), Dynamic::Int(5));

    let times_ten = mapping("timesTen", |n| n * 10);
    let gauge = runtime
        .decorate(gauge, "level", MemberKind::Getter, [times_ten], Vec::new())
        .unwrap();
    assert_eq!(runtime.get(&gauge, "level").unwrap(), Dynamic::Int(40));

    let gauge = runtime
        .decorate(gauge, "level", MemberKind::Getter, Vec::<DecoratorRef>::new(), Vec::new())
        .unwrap();
    assert_eq!(runtime.get(&gauge, "level").unwrap(), Dynamic::Int(4));
}

#[test]
fn test_contract_violation_keeps_previous_chain() {
    let mut runtime = Runtime::new();
    let nothing = Decorator::new("nothing", Arity::Exact(2), |_wrapped, _ctx, _args| {
        Ok(Vec::new())
    });
    runtime.register_decorator("nothing", nothing).unwrap();
    runtime.register_class(gauge_class()).unwrap();
    let gauge = runtime.construct("Gauge", empty()).unwrap();
    let plus_one = mapping("plusOne", |n| n + 1);
    let gauge = runtime
        .decorate(gauge, "level", MemberKind::Getter, [plus_one], Vec::new())
        .unwrap();

    let err = runtime
        .decorate(gauge.clone(), "level", MemberKind::Getter, ["nothing"], Vec::new())
        .unwrap_err();
    assert_eq!(
        err,
        DecorationError::ContractViolation {
            kind: MemberKind::Getter,
            member: "level".into(),
            step: 1,
            decorator: "nothing".into(),
            reason: ContractViolation::OutputCount { count: 0 },
        }
    );
    assert_eq!(runtime.get(&gauge, "level").unwrap(), Dynamic::Int(5));
}

// =============================================================================
// Aggregates
// =============================================================================

#[test]
fn test_aggregate_getter_outputs() {
    let observers = Observers::default();
    let mut runtime = Runtime::with_observers(&observers);
    runtime
        .register_class(
            ClassBuilder::reference("Sensor")
                .property_with("reading", 0i64, "GetDecorator = @countCalls")
                .build()
                .unwrap(),
        )
        .unwrap();
    let sensors: Vec<Dynamic> = (1..=3)
        .map(|n| {
            runtime
                .construct("Sensor", [("reading", Dynamic::Int(n))])
                .unwrap()
        })
        .collect();
    let all = Dynamic::list(sensors);

    let values = runtime.read(&all, &[Segment::field("reading")], 2).unwrap();
    assert_eq!(values, vec![Dynamic::Int(1), Dynamic::Int(2)]);
    // Each instance carries its own counter.
    assert_eq!(observers.counter.counts_for("Sensor.reading"), vec![1, 1]);

    let err = runtime.read(&all, &[Segment::field("reading")], 4).unwrap_err();
    assert!(matches!(
        err,
        DispatchError::TooManyOutputs {
            ref member,
            requested: 4,
            available: 3,
        } if member == "reading"
    ));
}

// =============================================================================
// Policies
// =============================================================================

fn vault(limit_attribute: &str) -> (Runtime, Dynamic) {
    let mut runtime = Runtime::with_standard_policies();
    runtime
        .register_class(
            ClassBuilder::reference("Vault")
                .method_with(
                    "open",
                    Signature::method(0, Arity::Exact(1)),
                    limit_attribute,
                    |ctx: &mut CallContext<'_>| {
                        ctx.set_return(true);
                        Ok(())
                    },
                )
                .build()
                .unwrap(),
        )
        .unwrap();
    let vault = runtime.construct("Vault", empty()).unwrap();
    (runtime, vault)
}

#[test]
fn test_one_shot_default_limit() {
    let (mut runtime, vault) = vault("Decorator = @oneShot");
    assert_eq!(runtime.call(&vault, "open", Vec::new(), 1).unwrap(), vec![Dynamic::Bool(true)]);

    let err = runtime.call(&vault, "open", Vec::new(), 1).unwrap_err();
    assert!(matches!(
        err,
        DispatchError::DecoratedCallback {
            kind: MemberKind::Method,
            source: NativeError::Exhausted { limit: 1, .. },
            ..
        }
    ));
}

#[test]
fn test_one_shot_explicit_limit() {
    let (mut runtime, vault) = vault("Decorator = @oneShot(3)");
    for _ in 0..3 {
        runtime.call(&vault, "open", Vec::new(), 1).unwrap();
    }
    let err = runtime.call(&vault, "open", Vec::new(), 1).unwrap_err();
    assert!(matches!(
        err,
        DispatchError::DecoratedCallback {
            source: NativeError::Exhausted { limit: 3, .. },
            ..
        }
    ));
}

#[test]
fn test_immutable_setter() {
    let mut runtime = Runtime::with_standard_policies();
    runtime
        .register_class(
            ClassBuilder::reference("Config")
                .property_with("path", "", "SetDecorator = @immutable")
                .build()
                .unwrap(),
        )
        .unwrap();
    let config = runtime.construct("Config", empty()).unwrap();

    runtime.set(config.clone(), "path", "/etc/app").unwrap();
    let err = runtime.set(config.clone(), "path", "/tmp").unwrap_err();
    assert!(matches!(
        err,
        DispatchError::DecoratedCallback {
            kind: MemberKind::Setter,
            source: NativeError::Immutable { .. },
            ..
        }
    ));
    assert_eq!(runtime.get(&config, "path").unwrap(), Dynamic::String("/etc/app".into()));
}

#[test]
fn test_counted_getter() {
    let observers = Observers::default();
    let mut runtime = Runtime::with_observers(&observers);
    runtime
        .register_class(
            ClassBuilder::reference("Account")
                .property_with("balance", 10i64, "GetDecorator = @countCalls")
                .build()
                .unwrap(),
        )
        .unwrap();
    let account = runtime.construct("Account", empty()).unwrap();

    for _ in 0..3 {
        assert_eq!(runtime.get(&account, "balance").unwrap(), Dynamic::Int(10));
    }
    assert_eq!(observers.counter.counts_for("Account.balance"), vec![1, 2, 3]);
}

#[test]
fn test_one_shot_delayed_method() {
    let clock = ManualClock::new();
    let mut runtime = Runtime::with_standard_policies().with_clock(clock.clone());
    runtime
        .register_class(
            ClassBuilder::reference("Door")
                .property("opened", false)
                .method_with(
                    "open",
                    Signature::method(0, Arity::Exact(0)),
                    "Decorator = [@oneShot, @delayedExec(3)]",
                    |ctx: &mut CallContext<'_>| {
                        let door = ctx.receiver()?.clone();
                        ctx.host().write(door, &[Segment::field("opened")], Dynamic::Bool(true))?;
                        Ok(())
                    },
                )
                .build()
                .unwrap(),
        )
        .unwrap();
    let door = runtime.construct("Door", empty()).unwrap();

    runtime.call(&door, "open", Vec::new(), 0).unwrap();
    assert_eq!(runtime.get(&door, "opened").unwrap(), Dynamic::Bool(false));

    let early = runtime.call(&door, "open", Vec::new(), 0).unwrap_err();
    assert!(matches!(
        early,
        DispatchError::DecoratedCallback {
            source: NativeError::Exhausted { .. },
            ..
        }
    ));

    clock.advance(Duration::from_secs(2));
    assert_eq!(runtime.run_due_timers(), 0);
    assert_eq!(runtime.get(&door, "opened").unwrap(), Dynamic::Bool(false));

    clock.advance(Duration::from_secs(1));
    assert_eq!(runtime.run_due_timers(), 1);
    assert_eq!(runtime.get(&door, "opened").unwrap(), Dynamic::Bool(true));

    let late = runtime.call(&door, "open", Vec::new(), 0).unwrap_err();
    assert!(matches!(
        late,
        DispatchError::DecoratedCallback {
            source: NativeError::Exhausted { .. },
            ..
        }
    ));
    assert_eq!(runtime.pending_timers(), 0);
}
