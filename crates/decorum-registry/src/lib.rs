//! Decorator registry for decorum.
//!
//! - [`Decorator`] / [`DecoratorFn`]: the decorator contract
//! - [`DecoratorNamespace`]: the symbol table decorator names resolve in
//! - [`DecoratorResolver`]: spec (name + raw args) to decorator + values
//! - [`ChainBuilder`]: composition with per-step contract validation

pub mod chain;
pub mod decorator;
pub mod namespace;
pub mod resolver;

pub use chain::{ChainBuilder, validate_chain};
pub use decorator::{Decorator, DecoratorFn};
pub use namespace::DecoratorNamespace;
pub use resolver::{DecoratorResolver, ResolvedDecorator};

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use decorum_core::{
        Arity, CallContext, Callable, ContractViolation, DecorationContext, DecorationError,
        DecoratorSpec, DetachedHost, Dynamic, InstanceId, LiteralError, MemberKind, Semantics,
        Signature, SourceInstance,
    };

    use super::*;

    type Log = Arc<Mutex<Vec<String>>>;

    fn context(kind: MemberKind, member: &str) -> Arc<DecorationContext> {
        DecorationContext::new(
            kind,
            member,
            SourceInstance {
                id: InstanceId(1),
                class: Arc::from("Sensor"),
                handle: None,
            },
        )
    }

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

    fn base_method(log: &Log) -> Callable {
        let log = Arc::clone(log);
        Callable::new(
            "fire",
            Signature::method(0, Arity::Exact(0)),
            move |_ctx: &mut CallContext<'_>| {
                log.lock().unwrap().push("b".into());
                Ok(())
            },
        )
    }

    fn getter() -> Callable {
        Callable::new("value", Signature::getter(), |ctx: &mut CallContext<'_>| {
            ctx.set_return(5i64);
            Ok(())
        })
    }

    fn resolved(decorator: Decorator) -> ResolvedDecorator {
        ResolvedDecorator::direct(decorator, Vec::new())
    }

    #[test]
    fn leftmost_decorator_is_outermost() {
        let log: Log = Arc::default();
        let builder = ChainBuilder::new(context(MemberKind::Method, "fire"), Semantics::Reference);
        let chain = builder
            .build(
                base_method(&log),
                &[resolved(logging("d1", &log)), resolved(logging("d2", &log))],
            )
            .unwrap();

        chain.call(&mut DetachedHost::new(), vec![Dynamic::Null], 0).unwrap();
        assert_eq!(
            *log.lock().unwrap(),
            vec!["d1-enter", "d2-enter", "b", "d2-exit", "d1-exit"]
        );
    }

    #[test]
    fn presets_expand_in_place() {
        let log: Log = Arc::default();
        let preset = Decorator::preset([logging("p1", &log), logging("p2", &log)]);
        let builder = ChainBuilder::new(context(MemberKind::Method, "fire"), Semantics::Reference);
        let chain = builder
            .build(base_method(&log), &[resolved(preset), resolved(logging("d3", &log))])
            .unwrap();

        chain.call(&mut DetachedHost::new(), vec![Dynamic::Null], 0).unwrap();
        let entered: Vec<String> = log
            .lock()
            .unwrap()
            .iter()
            .filter(|e| e.ends_with("-enter"))
            .cloned()
            .collect();
        assert_eq!(entered, vec!["p1-enter", "p2-enter", "d3-enter"]);
    }

    #[test]
    fn no_decorators_is_the_base() {
        let base = getter();
        let builder = ChainBuilder::new(context(MemberKind::Getter, "value"), Semantics::Reference);
        let chain = builder.build(base.clone(), &[]).unwrap();
        assert!(chain.ptr_eq(&base));
    }

    #[test]
    fn zero_outputs_is_a_contract_violation() {
        let log: Log = Arc::default();
        let silent = Decorator::new("silent", Arity::AtLeast(2), |_wrapped, _ctx, _args| {
            Ok(Vec::new())
        });
        let builder = ChainBuilder::new(context(MemberKind::Getter, "value"), Semantics::Reference);
        let err = builder
            .build(getter(), &[resolved(silent), resolved(logging("inner", &log))])
            .unwrap_err();

        assert_eq!(
            err,
            DecorationError::ContractViolation {
                kind: MemberKind::Getter,
                member: "value".into(),
                step: 2,
                decorator: "silent".into(),
                reason: ContractViolation::OutputCount { count: 0 },
            }
        );
    }

    #[test]
    fn decorator_must_return_a_callable() {
        let bad = Decorator::new("number", Arity::AtLeast(2), |_wrapped, _ctx, _args| {
            Ok(vec![Dynamic::Int(1)])
        });
        let builder = ChainBuilder::new(context(MemberKind::Method, "fire"), Semantics::Reference);
        let err = builder.build(getter(), &[resolved(bad)]).unwrap_err();
        assert!(matches!(
            err,
            DecorationError::ContractViolation {
                reason: ContractViolation::NotCallable { type_name: "int" },
                step: 1,
                ..
            }
        ));
    }

    #[test]
    fn decorator_params_must_cover_arguments() {
        let narrow = Decorator::new("narrow", Arity::Exact(2), |wrapped, _ctx, _args| {
            Ok(vec![Dynamic::Function(wrapped)])
        });
        let builder = ChainBuilder::new(context(MemberKind::Method, "fire"), Semantics::Reference);

        assert!(builder.build(getter(), &[resolved(narrow.clone())]).is_ok());

        let with_arg = ResolvedDecorator::direct(narrow, vec![Dynamic::Int(3)]);
        let err = builder.build(getter(), &[with_arg]).unwrap_err();
        assert!(matches!(
            err,
            DecorationError::ContractViolation {
                reason: ContractViolation::DecoratorParams { required: 3, extra: 1, .. },
                ..
            }
        ));
    }

    #[test]
    fn getter_chain_must_keep_one_parameter() {
        let widen = Decorator::simple("widen", |wrapped, _ctx, _args| {
            Ok(wrapped.with_signature(Signature::variadic()))
        });
        let builder = ChainBuilder::new(context(MemberKind::Getter, "value"), Semantics::Reference);
        let err = builder.build(getter(), &[resolved(widen)]).unwrap_err();
        assert!(matches!(
            err,
            DecorationError::ContractViolation {
                reason: ContractViolation::ChainParams { expected: 1, actual: Arity::Any, .. },
                ..
            }
        ));
    }

    #[test]
    fn setter_outputs_follow_semantics() {
        let identity = Decorator::simple("identity", |wrapped, _ctx, _args| Ok(wrapped));
        let by_ref = Callable::new("set", Signature::setter(0), |_ctx: &mut CallContext<'_>| {
            Ok(())
        });

        let reference =
            ChainBuilder::new(context(MemberKind::Setter, "value"), Semantics::Reference);
        assert!(reference.build(by_ref.clone(), &[resolved(identity.clone())]).is_ok());

        let value = ChainBuilder::new(context(MemberKind::Setter, "value"), Semantics::Value);
        let err = value.build(by_ref, &[resolved(identity)]).unwrap_err();
        assert!(matches!(
            err,
            DecorationError::ContractViolation {
                reason: ContractViolation::ChainOutputs { expected: 1, .. },
                ..
            }
        ));
    }

    #[test]
    fn apply_failure_is_reported_with_step() {
        let failing = Decorator::new("failing", Arity::AtLeast(2), |_wrapped, _ctx, args| {
            Err(decorum_core::NativeError::other(format!("bad args: {}", args.len())))
        });
        let builder = ChainBuilder::new(context(MemberKind::Method, "fire"), Semantics::Reference);
        let err = builder
            .build(getter(), &[ResolvedDecorator::direct(failing, vec![Dynamic::Null])])
            .unwrap_err();
        assert!(err.to_string().contains("bad args: 1"));
    }

    #[test]
    fn namespace_rejects_duplicates() {
        let mut namespace = DecoratorNamespace::new();
        let identity = Decorator::simple("identity", |wrapped, _ctx, _args| Ok(wrapped));
        namespace.register("identity", identity.clone()).unwrap();
        assert_eq!(
            namespace.register("identity", identity.clone()),
            Err(DecorationError::DuplicateDecorator("identity".into()))
        );
        assert!(namespace.insert("identity", identity.clone()).is_some());

        let mut other = DecoratorNamespace::new();
        other.register("identity", identity).unwrap();
        assert!(namespace.merge(other).is_err());
        assert_eq!(namespace.names(), vec!["identity"]);
    }

    #[test]
    fn resolver_evaluates_text_and_passes_values() {
        let mut namespace = DecoratorNamespace::new();
        namespace
            .register("limit", Decorator::simple("limit", |wrapped, _ctx, _args| Ok(wrapped)))
            .unwrap();
        let resolver = DecoratorResolver::new(&namespace);

        let spec = DecoratorSpec::parsed("limit", "3, 'x'", Default::default());
        let from_text = resolver
            .resolve(MemberKind::Method, "fire", &spec)
            .unwrap();
        assert_eq!(from_text.args, vec![Dynamic::Int(3), Dynamic::String("x".into())]);

        let spec = DecoratorSpec::with_values("limit", [Dynamic::Bool(true)]);
        let from_values = resolver
            .resolve(MemberKind::Method, "fire", &spec)
            .unwrap();
        assert_eq!(from_values.args, vec![Dynamic::Bool(true)]);
    }

    #[test]
    fn resolver_errors() {
        let namespace = DecoratorNamespace::new();
        let resolver = DecoratorResolver::new(&namespace);
        let err = resolver
            .resolve(MemberKind::Getter, "value", &DecoratorSpec::named("missing"))
            .unwrap_err();
        assert_eq!(
            err,
            DecorationError::Resolution {
                name: "missing".into(),
                kind: MemberKind::Getter,
                member: "value".into(),
            }
        );

        let mut namespace = DecoratorNamespace::new();
        namespace
            .register("limit", Decorator::simple("limit", |wrapped, _ctx, _args| Ok(wrapped)))
            .unwrap();
        let resolver = DecoratorResolver::new(&namespace);
        let spec = DecoratorSpec::parsed("limit", "count", Default::default());
        let err = resolver
            .resolve(MemberKind::Method, "fire", &spec)
            .unwrap_err();
        assert!(matches!(
            err,
            DecorationError::InvalidArguments {
                source: LiteralError::UnknownIdentifier { .. },
                ..
            }
        ));
    }
}
