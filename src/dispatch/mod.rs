//! Interception dispatcher.
//!
//! Every read, write and call against an instance goes through here. The
//! first segment of a path is matched against the lead instance's
//! registry; a decorated getter, setter or method takes over, anything
//! else falls back to default access. Remaining segments are dispatched
//! recursively onto the result.
//!
//! ## Reads
//!
//! | member            | no further segments        | further segments         |
//! |-------------------|----------------------------|--------------------------|
//! | getter, N inst    | k = nargout outputs, k ≤ N | N must be 1              |
//! | decorated method  | lead chain, all outputs    | continue on first output |
//! | undecorated       | default access             | default, then continue   |
//!
//! ## Writes
//!
//! A decorated setter takes the fully computed value (nested paths are
//! written into the current value first). A decorated method used as an
//! assignment target must return a heap instance, which is written in
//! place.

mod read;
mod write;

use decorum_core::{Callable, DispatchError, Dynamic, IntoDynamic, MemberKind, Segment};

use crate::Runtime;

impl Runtime {
    /// Dispatch a read or call expression.
    ///
    /// `nargout` is the number of outputs requested. For a decorated getter
    /// on an aggregate it selects how many instances are read.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn read(
        &mut self,
        receiver: &Dynamic,
        path: &[Segment],
        nargout: usize,
    ) -> Result<Vec<Dynamic>, DispatchError> {
        self.dispatch_read(receiver, path, nargout)
    }

    /// Dispatch an assignment of `value` to `path` under `receiver`.
    ///
    /// Returns the updated receiver binding: the same handle for heap
    /// instances, a new value for value-semantics instances and plain
    /// containers.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn write(
        &mut self,
        receiver: Dynamic,
        path: &[Segment],
        value: Dynamic,
    ) -> Result<Dynamic, DispatchError> {
        self.dispatch_write(receiver, path, value)
    }

    /// Read one member: `receiver.member`.
    pub fn get(&mut self, receiver: &Dynamic, member: &str) -> Result<Dynamic, DispatchError> {
        let outputs = self.read(receiver, &[Segment::field(member)], 1)?;
        Ok(outputs.into_iter().next().unwrap_or_default())
    }

    /// Assign one member: `receiver.member = value`.
    pub fn set(
        &mut self,
        receiver: Dynamic,
        member: &str,
        value: impl IntoDynamic,
    ) -> Result<Dynamic, DispatchError> {
        self.write(receiver, &[Segment::field(member)], value.into_dynamic())
    }

    /// Call one method: `receiver.method(args...)`.
    pub fn call(
        &mut self,
        receiver: &Dynamic,
        method: &str,
        args: Vec<Dynamic>,
        nargout: usize,
    ) -> Result<Vec<Dynamic>, DispatchError> {
        self.read(receiver, &[Segment::field(method), Segment::Call(args)], nargout)
    }

    pub(crate) fn dispatch_read(
        &mut self,
        receiver: &Dynamic,
        path: &[Segment],
        nargout: usize,
    ) -> Result<Vec<Dynamic>, DispatchError> {
        self.enter_dispatch()?;
        let result = self.read_path(receiver, path, nargout);
        self.depth -= 1;
        result
    }

    pub(crate) fn dispatch_write(
        &mut self,
        receiver: Dynamic,
        path: &[Segment],
        value: Dynamic,
    ) -> Result<Dynamic, DispatchError> {
        self.enter_dispatch()?;
        let result = self.write_path(receiver, path, value);
        self.depth -= 1;
        result
    }

    fn enter_dispatch(&mut self) -> Result<(), DispatchError> {
        let limit = self.config().max_dispatch_depth;
        if self.depth >= limit {
            return Err(DispatchError::RecursionLimit { limit });
        }
        self.depth += 1;
        Ok(())
    }

    /// The chain installed on `instance` for (kind, member).
    fn chain_of(
        &self,
        instance: &Dynamic,
        kind: MemberKind,
        member: &str,
    ) -> Result<Option<Callable>, DispatchError> {
        Ok(self
            .instance(instance)?
            .decorations()
            .get(kind, member)
            .cloned())
    }

    /// Run a decorated chain, rewrapping whatever it raises.
    fn call_decorated(
        &mut self,
        chain: &Callable,
        kind: MemberKind,
        member: &str,
        args: Vec<Dynamic>,
        nargout: usize,
    ) -> Result<Vec<Dynamic>, DispatchError> {
        tracing::trace!(member, %kind, nargout, "decorated dispatch");
        chain
            .call(self, args, nargout)
            .map_err(|source| DispatchError::DecoratedCallback {
                kind,
                member: member.to_string(),
                source,
            })
    }

    /// Run an undecorated method body (inside its class scope).
    fn call_method(
        &mut self,
        lead: &Dynamic,
        member: &str,
        args: Vec<Dynamic>,
        nargout: usize,
    ) -> Result<Vec<Dynamic>, DispatchError> {
        let class = self.instance(lead)?.class().clone();
        let method = class.method(member).ok_or_else(|| DispatchError::NoSuchMember {
            type_name: class.name().to_string(),
            member: member.to_string(),
        })?;
        let body = crate::decorate::base_method(class.name_arc(), &method.body);
        tracing::trace!(member, nargout, "default method dispatch");
        body.call(self, args, nargout)
            .map_err(|source| DispatchError::MethodFailed {
                member: member.to_string(),
                source,
            })
    }

    /// Default read of a declared property.
    fn read_field(&self, instance: &Dynamic, member: &str) -> Result<Dynamic, DispatchError> {
        let instance = self.instance(instance)?;
        instance
            .field(member)
            .cloned()
            .ok_or_else(|| DispatchError::NoSuchMember {
                type_name: instance.class_name().to_string(),
                member: member.to_string(),
            })
    }
}

/// Split a leading `Call` segment off `rest`: the method arguments and what
/// follows them.
fn call_arguments(rest: &[Segment]) -> (Vec<Dynamic>, &[Segment]) {
    match rest.split_first() {
        Some((Segment::Call(args), rest)) => (args.clone(), rest),
        _ => (Vec::new(), rest),
    }
}

/// `receiver` followed by `args`.
fn with_receiver(receiver: &Dynamic, args: Vec<Dynamic>) -> Vec<Dynamic> {
    let mut all = Vec::with_capacity(args.len() + 1);
    all.push(receiver.clone());
    all.extend(args);
    all
}
