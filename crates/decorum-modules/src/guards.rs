//! Guard policies: `oneShot`, `immutable` and `restricted`.
//!
//! Guards reject a call before it reaches the wrapped callable; the
//! rejection surfaces from dispatch as a decorated-callback error.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use decorum_core::{Arity, CallContext, Callable, MemberKind, NativeError};
use decorum_registry::Decorator;

use crate::arg_or;

/// `oneShot` / `oneShot(limit)`: allows `limit` calls (default 1), then
/// fails every later call with [`NativeError::Exhausted`].
pub fn one_shot() -> Decorator {
    Decorator::wrapper("oneShot", Arity::AtLeast(2), |wrapped, ctx, args| {
        if args.len() > 1 {
            return Err(NativeError::other(format!(
                "oneShot takes at most one limit, got {} arguments",
                args.len()
            )));
        }
        let limit: u64 = arg_or(args, 0, 1)?;
        let member = ctx.qualified_member();
        let calls = Arc::new(AtomicU64::new(0));
        let inner = wrapped.clone();

        Ok(Callable::wrapping(&wrapped, "oneShot", move |call: &mut CallContext<'_>| {
            let taken = calls.fetch_add(1, Ordering::Relaxed);
            if taken >= limit {
                calls.store(limit, Ordering::Relaxed);
                tracing::debug!(member = %member, limit, "call limit reached");
                return Err(NativeError::Exhausted {
                    member: member.clone(),
                    limit,
                });
            }
            let outputs = call.forward(&inner)?;
            call.set_outputs(outputs);
            Ok(())
        }))
    })
}

/// `immutable`: the first successful set sticks; every later set fails
/// with [`NativeError::Immutable`]. Only valid on setters.
pub fn immutable() -> Decorator {
    Decorator::wrapper("immutable", Arity::Exact(2), |wrapped, ctx, _args| {
        if ctx.kind != MemberKind::Setter {
            return Err(NativeError::other(format!(
                "immutable applies to setters, not to {} '{}'",
                ctx.kind, ctx.member
            )));
        }
        let member = ctx.qualified_member();
        let written = Arc::new(AtomicBool::new(false));
        let inner = wrapped.clone();

        Ok(Callable::wrapping(&wrapped, "immutable", move |call: &mut CallContext<'_>| {
            if written.load(Ordering::Acquire) {
                return Err(NativeError::Immutable {
                    member: member.clone(),
                });
            }
            let outputs = call.forward(&inner)?;
            written.store(true, Ordering::Release);
            call.set_outputs(outputs);
            Ok(())
        }))
    })
}

/// `restricted` / `restricted('Class')`: only callable while a method body
/// of the owning class (or the named class) is executing.
pub fn restricted() -> Decorator {
    Decorator::wrapper("restricted", Arity::AtLeast(2), |wrapped, ctx, args| {
        if args.len() > 1 {
            return Err(NativeError::other(format!(
                "restricted takes at most one class name, got {} arguments",
                args.len()
            )));
        }
        let class: String = arg_or(args, 0, ctx.class().to_string())?;
        let member = ctx.qualified_member();
        let inner = wrapped.clone();

        Ok(Callable::wrapping(&wrapped, "restricted", move |call: &mut CallContext<'_>| {
            if call.host_ref().current_scope() != Some(class.as_str()) {
                tracing::debug!(
                    member = %member,
                    scope = ?call.host_ref().current_scope(),
                    "access denied"
                );
                return Err(NativeError::AccessDenied {
                    member: member.clone(),
                    class: class.clone(),
                });
            }
            let outputs = call.forward(&inner)?;
            call.set_outputs(outputs);
            Ok(())
        }))
    })
}
