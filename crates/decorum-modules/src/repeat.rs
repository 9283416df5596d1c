//! `doubleInvoke`: calls the wrapped callable twice and keeps the outputs
//! of the second call.

use decorum_core::{Arity, CallContext, Callable};
use decorum_registry::Decorator;

pub fn double_invoke() -> Decorator {
    Decorator::wrapper("doubleInvoke", Arity::Exact(2), |wrapped, _ctx, _args| {
        let inner = wrapped.clone();
        Ok(Callable::wrapping(&wrapped, "doubleInvoke", move |call: &mut CallContext<'_>| {
            call.forward(&inner)?;
            let outputs = call.forward(&inner)?;
            call.set_outputs(outputs);
            Ok(())
        }))
    })
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI64, Ordering};
    use std::sync::Arc;

    use decorum_core::{
        DecorationContext, DetachedHost, Dynamic, InstanceId, MemberKind, Semantics, Signature,
        SourceInstance,
    };
    use decorum_registry::{ChainBuilder, ResolvedDecorator};

    use super::*;

    #[test]
    fn runs_twice_and_returns_second() {
        let hits = Arc::new(AtomicI64::new(0));
        let counter = Arc::clone(&hits);
        let signature = Signature::method(0, Arity::Exact(1));
        let base = Callable::new("bump", signature, move |ctx: &mut CallContext<'_>| {
            ctx.set_return(counter.fetch_add(1, Ordering::Relaxed) + 1);
            Ok(())
        });
        let ctx = DecorationContext::new(
            MemberKind::Method,
            "bump",
            SourceInstance {
                id: InstanceId(1),
                class: Arc::from("Dial"),
                handle: None,
            },
        );
        let chain = ChainBuilder::new(ctx, Semantics::Reference)
            .build(base, &[ResolvedDecorator::direct(double_invoke(), Vec::new())])
            .unwrap();

        let outputs = chain.call(&mut DetachedHost::new(), vec![Dynamic::Null], 1).unwrap();
        assert_eq!(outputs, vec![Dynamic::Int(2)]);
        assert_eq!(hits.load(Ordering::Relaxed), 2);
    }
}
